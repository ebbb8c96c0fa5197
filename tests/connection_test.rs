#[cfg(test)]
mod connection {
    use std::path::Path;

    use rental_ingest::{
        config::DbConfig,
        db::{self, schema::BOOKINGS},
        loader::{self, LoadOptions},
    };

    fn unreachable() -> DbConfig {
        DbConfig::from_lookup(|key| {
            let value = match key {
                "DB_HOST" => "127.0.0.1",
                "DB_PORT" => "1",
                "DB_USER" => "loader",
                "DB_PASSWORD" => "secret",
                "DB_NAME" => "rentals",
                "DB_CONNECT_TIMEOUT" => "2",
                _ => return None,
            };
            Some(value.to_string())
        })
        .unwrap()
    }

    #[test]
    fn unreachable_host_fails_to_connect() {
        assert!(db::connect(&unreachable()).is_err());
    }

    #[test]
    fn unreachable_host_skips_the_load() {
        let config = unreachable();

        let outcome = loader::run(
            &BOOKINGS,
            Path::new("/nonexistent/booking.csv"),
            LoadOptions::for_table(&BOOKINGS),
            || db::connect(&config),
        )
        .unwrap();

        assert!(outcome.is_none());
    }
}
