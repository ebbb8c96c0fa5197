use crate::models::{Column, ColumnType::*, TableSpec};

pub static APARTMENTS: TableSpec = TableSpec {
    name: "apartments",
    label: "apartments",
    columns: &[
        Column::new("id", BigInt),
        Column::new("title", Varchar(255)),
        Column::new("source", Varchar(100)),
        Column::new("price", Float),
        Column::new("currency", Varchar(10)),
        Column::new("listing_created_on", Date),
        Column::new("is_active", Bool),
        Column::new("last_modified_timestamp", Date),
    ],
    key: &["id"],
    default_csv_path: "../data_source/apartment.csv",
    default_chunk_size: 10000,
};

pub static APARTMENTS_ATTRIBUTES: TableSpec = TableSpec {
    name: "apartments_attributes",
    label: "apartment attributes",
    columns: &[
        Column::new("id", BigInt),
        Column::new("category", Varchar(100)),
        Column::new("body", Text),
        Column::new("amenities", Text),
        Column::new("bathrooms", Int),
        Column::new("bedrooms", Int),
        Column::new("fee", Float),
        Column::new("has_photo", Bool),
        Column::new("pets_allowed", Varchar(50)),
        Column::new("price_display", Varchar(50)),
        Column::new("price_type", Varchar(50)),
        Column::new("square_feet", Int),
        Column::new("address", Varchar(255)),
        Column::new("cityname", Varchar(100)),
        Column::new("state", Varchar(100)),
        Column::new("latitude", Float),
        Column::new("longitude", Float),
    ],
    key: &["id"],
    default_csv_path: "/data/apartment_attributes.csv",
    default_chunk_size: 5000,
};

pub static BOOKINGS: TableSpec = TableSpec {
    name: "bookings",
    label: "bookings",
    columns: &[
        Column::new("booking_id", BigInt),
        Column::new("user_id", BigInt),
        Column::new("apartment_id", BigInt),
        Column::new("booking_date", Date),
        Column::new("checkin_date", Date),
        Column::new("checkout_date", Date),
        Column::new("total_price", Float),
        Column::new("currency", Varchar(10)),
        Column::new("booking_status", Varchar(50)),
    ],
    key: &["booking_id"],
    default_csv_path: "../data_source/booking.csv",
    default_chunk_size: 5000,
};

pub static USER_VIEWINGS: TableSpec = TableSpec {
    name: "user_viewings",
    label: "user viewings",
    columns: &[
        Column::new("user_id", BigInt),
        Column::new("apartment_id", BigInt),
        Column::new("viewed_at", Date),
        Column::new("is_wishlisted", Bool),
        Column::new("call_to_action", Varchar(100)),
    ],
    key: &["user_id", "apartment_id", "viewed_at"],
    default_csv_path: "../data_source/user_viewings.csv",
    default_chunk_size: 5000,
};

/// Every destination table, in the order a full run loads them.
pub static ALL_TABLES: [&TableSpec; 4] = [
    &APARTMENTS,
    &APARTMENTS_ATTRIBUTES,
    &BOOKINGS,
    &USER_VIEWINGS,
];

pub fn find(name: &str) -> Option<&'static TableSpec> {
    ALL_TABLES.iter().copied().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_names_a_column() {
        for table in ALL_TABLES {
            assert_eq!(table.key_indices().len(), table.key.len(), "{}", table.name);
        }
    }

    #[test]
    fn find_by_table_name() {
        assert_eq!(find("bookings").map(|t| t.key), Some(&["booking_id"][..]));
        assert!(find("watchlists").is_none());
    }
}
