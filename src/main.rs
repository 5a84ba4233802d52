use anyhow::Context;
use checkout_wizard::config::cli::{CartCommand, Command};
use checkout_wizard::core::{Cart, PricingOptions, RequestContext, SessionStore};
use checkout_wizard::domain::model::{DeliveryKind, LineItem, Price, User};
use checkout_wizard::utils::error::ErrorSeverity;
use checkout_wizard::utils::{logger, validation::Validate};
use checkout_wizard::{
    CheckoutConfig, CheckoutError, CheckoutSettings, Checkout, Cli, CookieAnalytics,
    DeliveryPartitioner, FileSessionStore, FormData, JsonFileOrderRepository, StepOutcome,
};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = CheckoutConfig::from_file(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config))?;

    if config.json_logs() {
        logger::init_json_logger(config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI arguments: {:?}", cli);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let sessions = FileSessionStore::new(&config.storage.session_dir);
    let orders = JsonFileOrderRepository::new(&config.storage.orders_dir);
    let settings = config.checkout_settings();

    let record = sessions
        .load(&cli.session)
        .await
        .with_context(|| format!("loading session '{}'", cli.session))?;
    let mut request = RequestContext::new(record);
    if let Some(email) = &cli.user_email {
        request = request.with_user(User {
            id: 1,
            email: email.clone(),
        });
    }
    if let Some(cookie) = &cli.ga_cookie {
        request = request.with_cookie(checkout_wizard::adapters::analytics::GA_COOKIE, cookie);
    }
    let options = cli
        .discount
        .map(PricingOptions::with_discount)
        .unwrap_or_default();

    match run(&cli.command, &mut request, &settings, &options, &orders).await {
        Ok(()) => {
            sessions
                .save(&cli.session, &request.to_record())
                .await
                .with_context(|| format!("saving session '{}'", cli.session))?;
        }
        Err(e) => {
            tracing::error!(
                "❌ Checkout failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run(
    command: &Command,
    request: &mut RequestContext,
    settings: &CheckoutSettings,
    options: &PricingOptions,
    orders: &JsonFileOrderRepository,
) -> checkout_wizard::Result<()> {
    match command {
        Command::Cart(cart_command) => run_cart(cart_command, request, settings),
        Command::Steps => {
            let checkout = Checkout::new(request, settings, &DeliveryPartitioner);
            let next = checkout.next_step(options)?.map(|step| step.key().to_string());
            for step in &checkout {
                let marker = if next.as_deref() == Some(step.key()) {
                    "→"
                } else {
                    " "
                };
                match step.group() {
                    Some(group) => println!(
                        "{} {:<12} {:<16} {} item(s), {}",
                        marker,
                        step.key(),
                        step.kind(),
                        group.items.len(),
                        group.get_total_with_delivery(options)?
                    ),
                    None => println!("{} {:<12} {}", marker, step.key(), step.kind()),
                }
            }
            if next.is_none() {
                println!("✅ Checkout complete, run `place-order`");
            }
            Ok(())
        }
        Command::Submit { key, fields } => {
            let form: FormData = fields.iter().cloned().collect();
            let mut checkout = Checkout::new(request, settings, &DeliveryPartitioner);
            match checkout.submit(key, &form, options)? {
                StepOutcome::Advance => {
                    checkout.save();
                    println!("✅ Step '{}' saved", key);
                }
                StepOutcome::PlaceOrder => {
                    checkout.save();
                    match checkout.next_step(options)? {
                        Some(step) => println!(
                            "⚠️  Confirmation saved, but step '{}' ({}) is still incomplete",
                            step.key(),
                            step.kind()
                        ),
                        None => place_order(&mut checkout, options, orders).await?,
                    }
                }
            }
            Ok(())
        }
        Command::Total => {
            let checkout = Checkout::new(request, settings, &DeliveryPartitioner);
            println!("{}", checkout.get_total(options)?);
            Ok(())
        }
        Command::PlaceOrder => {
            let mut checkout = Checkout::new(request, settings, &DeliveryPartitioner);
            place_order(&mut checkout, options, orders).await
        }
    }
}

async fn place_order(
    checkout: &mut Checkout<'_>,
    options: &PricingOptions,
    orders: &JsonFileOrderRepository,
) -> checkout_wizard::Result<()> {
    if let Some(step) = checkout.next_step(options)? {
        return Err(CheckoutError::validation(
            step.key(),
            format!("Complete the {} step before placing the order", step.kind()),
        ));
    }
    let order = checkout.place_order(orders, &CookieAnalytics).await?;
    println!(
        "✅ Order {} placed, total {}",
        order.id.map(|id| id.to_string()).unwrap_or_default(),
        order.total()?
    );
    Ok(())
}

fn run_cart(
    command: &CartCommand,
    request: &mut RequestContext,
    settings: &CheckoutSettings,
) -> checkout_wizard::Result<()> {
    match command {
        CartCommand::Add {
            sku,
            name,
            price,
            quantity,
            digital,
        } => {
            let delivery = if *digital {
                DeliveryKind::Digital
            } else {
                DeliveryKind::Physical
            };
            request.cart.add_line(LineItem {
                sku: sku.clone(),
                name: name.clone(),
                quantity: *quantity,
                unit_price: Price::new(*price, settings.default_currency.clone()),
                delivery,
            });
            println!("🛒 Added {} x {}", quantity, name);
        }
        CartCommand::Show => {
            let cart = Cart::for_session_cart(&request.cart, settings.default_currency.clone());
            if cart.is_empty() {
                println!("🛒 Cart is empty");
            }
            for line in cart.lines() {
                println!(
                    "{:<10} {:<24} {:>3} x {} ({})",
                    line.sku, line.name, line.quantity, line.unit_price, line.delivery
                );
            }
        }
        CartCommand::Clear => {
            request.cart.clear();
            println!("🛒 Cart cleared");
        }
    }
    Ok(())
}
