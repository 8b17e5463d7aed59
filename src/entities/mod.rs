pub mod money {
    use rust_decimal::Decimal;
    use serde::Serializer;

    /// Money leaves the API with exactly two decimal places, whatever scale
    /// the storage backend hands back (SQLite drops trailing zeros).
    pub fn two_dp<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        let mut scaled = value.round_dp(2);
        scaled.rescale(2);
        serializer.serialize_str(&scaled.to_string())
    }
}

pub mod accessory_details;
pub mod config_value;
pub mod edging_tape_details;
pub mod handle_details;
pub mod hardware_details;
pub mod item;
pub mod materials_to_order;
pub mod materials_to_order_item;
pub mod materials_to_order_media;
pub mod purchase_order;
pub mod purchase_order_item;
pub mod sheet_details;
pub mod stock_transaction;
pub mod supplier;
pub mod supplier_contact;
pub mod supplier_statement;

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Price {
        #[serde(serialize_with = "super::money::two_dp")]
        amount: Decimal,
    }

    #[test]
    fn money_serializes_with_exactly_two_decimal_places() {
        let json = serde_json::to_value(Price {
            amount: Decimal::from(9),
        })
        .unwrap();
        assert_eq!(json["amount"], "9.00");

        let json = serde_json::to_value(Price {
            amount: "6.2".parse().unwrap(),
        })
        .unwrap();
        assert_eq!(json["amount"], "6.20");

        let json = serde_json::to_value(Price {
            amount: "10.005".parse().unwrap(),
        })
        .unwrap();
        assert_eq!(json["amount"], "10.00");
    }
}
