use super::*;


/// Helper to build a NewJob with sensible defaults for tests
fn sample_job(exchange: &str) -> NewJob {
    NewJob {
        exchange: exchange.to_string(),
        symbols: vec!["BTC-USDT".to_string()],
        data_types: vec!["trades".to_string()],
        start_date: "2024-01-01".to_string(),
        end_date: "2024-01-02".to_string(),
        output_path: "./datasets".to_string(),
        created_by: "intern".to_string(),
    }
}
