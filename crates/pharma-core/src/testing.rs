//! Fixtures shared by the unit tests.

use crate::money::Money;
use crate::types::{Medicine, MedicineId};

/// A stock line with 10 units, no expiry, no category.
pub fn medicine(id: MedicineId, code: &str, name: &str, ppv_cents: i64) -> Medicine {
    Medicine {
        id,
        code: code.to_string(),
        name: name.to_string(),
        form: "Comprimé".to_string(),
        presentation: "B/20".to_string(),
        ppv: Money::from_cents(ppv_cents),
        ph: Money::zero(),
        quantity: 10,
        expiry: None,
        category: None,
        raw: Default::default(),
    }
}
