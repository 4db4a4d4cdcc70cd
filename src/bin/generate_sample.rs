use chrono::{Duration, NaiveDate};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

fn main() {
    env_logger::init();

    let mut rng = SimpleRng::new(42);

    let customers = [
        "Alice", "Bob", "Charlie", "David", "Eve", "Frank", "Grace", "Heidi",
    ];
    let cities = ["Tokyo", "Osaka", "Kyoto", "Nagoya", "Sapporo"];
    let statuses = ["Active", "Inactive", "Pending"];
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");

    let n_rows = 200;
    let output_path = "sample_data.csv";
    let mut writer = csv::Writer::from_path(output_path).expect("Failed to create output file");
    writer
        .write_record(["order_id", "customer", "city", "status", "amount", "order_date"])
        .expect("Failed to write header");

    for order_id in 0..n_rows {
        let customer = rng.pick(&customers);
        let city = rng.pick(&cities);
        let status = rng.pick(&statuses);
        let amount = (rng.next_f64() * 5000.0 * 100.0).round() / 100.0;
        let order_date = start + Duration::days((rng.next_u64() % 365) as i64);

        writer
            .write_record([
                order_id.to_string(),
                customer.to_string(),
                city.to_string(),
                status.to_string(),
                format!("{amount:.2}"),
                order_date.format("%Y-%m-%d").to_string(),
            ])
            .expect("Failed to write record");
    }
    writer.flush().expect("Failed to flush output");

    log::info!("Wrote {n_rows} rows to {output_path}");
    println!("Wrote {n_rows} rows to {output_path}");
}
