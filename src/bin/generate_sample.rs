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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

const ROWS: usize = 120;

fn main() {
    let mut rng = SimpleRng::new(42);

    let categories = ["Hardware", "Software", "Services"];
    let names = ["Alice", "Bob", "Carol", "Dave", "Erin"];
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid start date");

    let mut records: Vec<[String; 5]> = Vec::with_capacity(ROWS + 4);
    for i in 0..ROWS {
        let date = start + Duration::days(i as i64);
        let category = rng.pick(&categories);
        let base = match category {
            "Hardware" => 120.0,
            "Software" => 80.0,
            _ => 50.0,
        };
        let value = rng.gauss(base, 15.0) + i as f64 * 0.3;
        let score = (value / 2.0 + rng.gauss(0.0, 8.0)).round() as i64;

        // Sprinkle missing cells over the numeric and name columns.
        let roll = rng.next_f64();
        let value = if roll < 0.04 { String::new() } else { format!("{value:.2}") };
        let score = if (0.04..0.07).contains(&roll) { String::new() } else { score.to_string() };
        let name = if (0.07..0.09).contains(&roll) {
            "NA".to_string()
        } else {
            rng.pick(&names).to_string()
        };

        records.push([
            date.format("%Y-%m-%d").to_string(),
            category.to_string(),
            name,
            value,
            score,
        ]);
    }

    records[17][0] = "not-a-date".to_string();

    // Exact duplicates for the cleaning menu.
    for idx in [3, 10, 42] {
        let dup = records[idx].clone();
        records.push(dup);
    }

    let output_path = "sample_data.csv";
    let mut writer = csv::Writer::from_path(output_path).expect("Failed to create output file");
    writer
        .write_record(["Date", "Category", "Name", "Value", "Score"])
        .expect("Failed to write header");
    for record in &records {
        writer.write_record(record).expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush writer");

    println!("Wrote {} rows to {output_path}", records.len());
}
