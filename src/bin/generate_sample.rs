//! Writes deterministic sample data for both dashboards:
//! `data/listings.csv` (short-term rental listings) and `data/gifts.csv`
//! (alumni gifts). A few rows are deliberately malformed so the cleaning
//! rules have something to drop.

use std::path::Path;

use anyhow::{Context, Result};
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

/// Currency text with thousands separators, e.g. `$1,250.00`.
fn money(v: f64) -> String {
    let cents = (v.abs() * 100.0).round() as u64;
    let digits = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if v < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

fn write_listings(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let neighbourhoods = [
        "Pearl", "Alberta Arts", "Sellwood", "Hawthorne", "Kerns", "Buckman", "St. Johns",
    ];
    // Weighted so the property-type selector has a clear most common entry.
    let property_types = [
        "Entire home", "Entire home", "Entire home", "Private room", "Private room",
        "Entire condo", "Tiny home",
    ];

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([
        "id",
        "name",
        "price",
        "review_scores_rating",
        "number_of_reviews",
        "neighbourhood_cleansed",
        "property_type",
    ])?;

    let n = 600;
    for id in 0..n {
        let hood = rng.pick(&neighbourhoods);
        let kind = rng.pick(&property_types);
        let price = rng.gauss(4.8, 0.6).exp().max(25.0);
        // Roughly one listing in twenty has no reviews yet.
        let rating = if rng.next_f64() < 0.05 {
            String::new()
        } else {
            format!("{:.2}", rng.gauss(4.7, 0.25).clamp(1.0, 5.0))
        };
        let reviews = (rng.next_f64() * 300.0) as u32;
        writer.write_record([
            id.to_string(),
            format!("{kind} in {hood} #{id}"),
            money(price),
            rating,
            reviews.to_string(),
            hood.to_string(),
            kind.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(n)
}

fn write_gifts(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let colleges = ["Engineering", "Liberal Arts", "Business", "Natural Sciences", "Law"];
    let majors = [
        "Civil Engineering", "Mechanical Engineering", "History", "Economics", "Finance",
        "Biology", "Chemistry", "Physics", "English", "Accounting", "Philosophy", "Music",
        "Computer Science", "Marketing", "Mathematics", "Government", "Psychology",
        "Architecture", "Geology", "Sociology", "Nursing", "Journalism",
    ];
    let places = [
        ("Austin", "TX"), ("Houston", "TX"), ("Dallas", "TX"), ("Denver", "CO"),
        ("Seattle", "WA"), ("Chicago", "IL"), ("New York", "NY"), ("Tulsa", "OK"),
    ];
    let first_day = NaiveDate::from_ymd_opt(2010, 1, 1).context("invalid start date")?;

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record([
        "Prospect ID",
        "Gift Amount",
        "Gift Date",
        "College",
        "Major",
        "Year of Graduation",
        "City",
        "State",
    ])?;

    let n = 2000;
    for id in 0..n {
        let college = rng.pick(&colleges);
        let major = rng.pick(&majors);
        let (city, state) = places[(rng.next_u64() % places.len() as u64) as usize];
        // Log-normal amounts; some refunds come through as zero or negative.
        let amount = rng.gauss(4.5, 1.4).exp() - 5.0;
        let date = first_day + Duration::days((rng.next_f64() * 3650.0) as i64);
        let date = if id % 97 == 0 {
            "unknown".to_string()
        } else {
            date.format("%m/%d/%Y").to_string()
        };
        let year = 1960 + (rng.next_f64() * 60.0) as i32;

        writer.write_record([
            format!("P{id:05}"),
            money(amount),
            date,
            college.to_string(),
            major.to_string(),
            year.to_string(),
            city.to_string(),
            state.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(n)
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let dir = Path::new("data");
    std::fs::create_dir_all(dir).context("creating data directory")?;

    let listings = dir.join("listings.csv");
    let n = write_listings(&listings, &mut rng)?;
    println!("Wrote {n} listings to {}", listings.display());

    let gifts = dir.join("gifts.csv");
    let n = write_gifts(&gifts, &mut rng)?;
    println!("Wrote {n} gifts to {}", gifts.display());

    Ok(())
}
