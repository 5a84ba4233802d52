use crate::domain::cart::Cart;
use crate::domain::model::{DeliveryGroup, DeliveryKind};
use crate::domain::ports::Partitioner;

/// Physical lines ship together in one group placed where the first physical line
/// appears; each digital line is delivered on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeliveryPartitioner;

impl Partitioner for DeliveryPartitioner {
    fn partition(&self, cart: &Cart) -> Vec<DeliveryGroup> {
        let mut groups: Vec<DeliveryGroup> = Vec::new();
        let mut physical: Option<usize> = None;

        for line in cart.lines() {
            match (line.delivery, physical) {
                (DeliveryKind::Physical, Some(position)) => {
                    groups[position].items.push(line.clone());
                }
                (DeliveryKind::Physical, None) => {
                    physical = Some(groups.len());
                    groups.push(DeliveryGroup::new(
                        DeliveryKind::Physical,
                        vec![line.clone()],
                        cart.currency(),
                    ));
                }
                (DeliveryKind::Digital, _) => {
                    groups.push(DeliveryGroup::new(
                        DeliveryKind::Digital,
                        vec![line.clone()],
                        cart.currency(),
                    ));
                }
            }
        }

        groups
    }
}
