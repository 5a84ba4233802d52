use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "checkout-wizard")]
#[command(about = "A step-by-step storefront checkout kept in session storage")]
pub struct Cli {
    #[arg(long, default_value = "checkout.toml")]
    pub config: String,

    #[arg(long, default_value = "default", help = "Session id to load and save")]
    pub session: String,

    #[arg(long, help = "Act as the logged-in customer with this email")]
    pub user_email: Option<String>,

    #[arg(long, help = "Value of the _ga analytics cookie")]
    pub ga_cookie: Option<String>,

    #[arg(long, help = "Percentage discount applied to item prices")]
    pub discount: Option<u8>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Inspect or change the cart
    #[command(subcommand)]
    Cart(CartCommand),
    /// List the checkout steps and show which one is next
    Steps,
    /// Submit a form for one step, e.g. `submit billing -f city=Oslo`
    Submit {
        key: String,
        #[arg(short = 'f', long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Print the checkout total including delivery
    Total,
    /// Create the order from a completed checkout
    PlaceOrder,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CartCommand {
    Add {
        #[arg(long)]
        sku: String,
        #[arg(long)]
        name: String,
        #[arg(long, help = "Unit price in minor units (cents)")]
        price: i64,
        #[arg(long, default_value = "1")]
        quantity: u32,
        #[arg(long, help = "Delivered by email instead of shipped")]
        digital: bool,
    },
    Show,
    Clear,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}
