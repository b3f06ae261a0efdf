//! Write a synthetic BRFSS-shaped extract to `data/sample.csv` and
//! `data/sample.parquet`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// `(abbr, name, lon, lat)`
const LOCATIONS: [(&str, &str, f64, f64); 8] = [
    ("NY", "New York", -75.5, 42.8),
    ("CA", "California", -120.0, 37.6),
    ("TX", "Texas", -99.4, 31.8),
    ("FL", "Florida", -81.9, 28.9),
    ("WA", "Washington", -120.5, 47.5),
    ("IL", "Illinois", -88.9, 40.5),
    ("GA", "Georgia", -83.6, 32.8),
    ("US", "United States, DC & Territories", f64::NAN, f64::NAN),
];

/// `(class, topic, question, typical value)`
const TOPICS: [(&str, &str, &str, f64); 6] = [
    ("Mental Health", "Frequent mental distress", "Percentage of older adults who are experiencing frequent mental distress", 11.0),
    ("Mental Health", "Lifetime diagnosis of depression", "Percentage of older adults with a lifetime diagnosis of depression", 19.0),
    ("Cognitive Decline", "Subjective cognitive decline or memory loss among older adults", "Percentage of older adults who reported subjective cognitive decline or memory loss", 11.5),
    ("Cognitive Decline", "Talked with health care professional about subjective cognitive decline or memory loss", "Percentage of older adults with subjective cognitive decline who talked to a professional", 45.0),
    ("Smoking and Alcohol Use", "Current smoking", "Percentage of older adults who have smoked at least 100 cigarettes and now smoke", 12.5),
    ("Smoking and Alcohol Use", "Binge drinking within past 30 days", "Percentage of older adults who reported binge drinking within the past 30 days", 7.0),
];

const AGE_GROUPS: [&str; 3] = ["50-64 years", "65 years or older", "Overall"];

/// `(category, values)`
const DEMOGRAPHICS: [(&str, &[&str]); 3] = [
    ("Overall", &["Overall"]),
    ("Sex", &["Female", "Male"]),
    ("Race/Ethnicity", &["White, non-Hispanic", "Black, non-Hispanic", "Hispanic", "Asian/Pacific Islander"]),
];

const YEAR_SPANS: [(i64, i64); 6] = [
    (2015, 2015),
    (2016, 2016),
    (2017, 2017),
    (2015, 2017),
    (2019, 2019),
    (2020, 2022),
];

const HEADERS: [&str; 16] = [
    "RowId",
    "YearStart",
    "YearEnd",
    "LocationAbbr",
    "LocationDesc",
    "Class",
    "Topic",
    "Question",
    "Data_Value_Unit",
    "Data_Value",
    "Low_Confidence_Limit",
    "High_Confidence_Limit",
    "AgeGroup",
    "DemographicCategory",
    "Demographic",
    "Geolocation",
];

struct SampleRow {
    row_id: i64,
    year_start: i64,
    year_end: i64,
    location_abbr: &'static str,
    location_desc: &'static str,
    class: &'static str,
    topic: &'static str,
    question: &'static str,
    value: Option<f64>,
    low: Option<f64>,
    high: Option<f64>,
    age_group: &'static str,
    category: &'static str,
    demographic: &'static str,
    geolocation: Option<String>,
}

fn generate(n: usize, rng: &mut SimpleRng) -> Vec<SampleRow> {
    (0..n)
        .map(|i| {
            let &(abbr, desc, lon, lat) = rng.pick(&LOCATIONS);
            let &(class, topic, question, typical) = rng.pick(&TOPICS);
            let &(category, values) = rng.pick(&DEMOGRAPHICS);
            let &(year_start, year_end) = rng.pick(&YEAR_SPANS);

            // About 5% suppressed values, as in the real extract.
            let value = if rng.next_f64() < 0.05 {
                None
            } else {
                Some((rng.gauss(typical, typical * 0.25).max(0.5) * 10.0).round() / 10.0)
            };
            let half_width = rng.gauss(3.0, 1.5).abs() + 0.2;
            let (low, high) = match value {
                Some(v) => (
                    Some(((v - half_width).max(0.0) * 10.0).round() / 10.0),
                    Some(((v + half_width) * 10.0).round() / 10.0),
                ),
                None => (None, None),
            };
            let geolocation = (!lon.is_nan()).then(|| {
                format!(
                    "POINT ({:.4} {:.4})",
                    lon + rng.gauss(0.0, 0.3),
                    lat + rng.gauss(0.0, 0.3)
                )
            });

            SampleRow {
                row_id: i as i64 + 1,
                year_start,
                year_end,
                location_abbr: abbr,
                location_desc: desc,
                class,
                topic,
                question,
                value,
                low,
                high,
                age_group: *rng.pick(&AGE_GROUPS),
                category,
                demographic: *rng.pick(values),
                geolocation,
            }
        })
        .collect()
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn write_csv(rows: &[SampleRow], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer.write_record(HEADERS)?;
    for r in rows {
        writer.write_record([
            r.row_id.to_string(),
            r.year_start.to_string(),
            r.year_end.to_string(),
            r.location_abbr.to_string(),
            r.location_desc.to_string(),
            r.class.to_string(),
            r.topic.to_string(),
            r.question.to_string(),
            "%".to_string(),
            fmt_opt(r.value),
            fmt_opt(r.low),
            fmt_opt(r.high),
            r.age_group.to_string(),
            r.category.to_string(),
            r.demographic.to_string(),
            r.geolocation.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(rows: &[SampleRow], path: &Path) -> Result<()> {
    let strings = |f: fn(&SampleRow) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let ints = |f: fn(&SampleRow) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let floats = |f: fn(&SampleRow) -> Option<f64>| -> ArrayRef {
        Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let columns: Vec<ArrayRef> = vec![
        ints(|r| r.row_id),
        ints(|r| r.year_start),
        ints(|r| r.year_end),
        strings(|r| r.location_abbr),
        strings(|r| r.location_desc),
        strings(|r| r.class),
        strings(|r| r.topic),
        strings(|r| r.question),
        strings(|_| "%"),
        floats(|r| r.value),
        floats(|r| r.low),
        floats(|r| r.high),
        strings(|r| r.age_group),
        strings(|r| r.category),
        strings(|r| r.demographic),
        Arc::new(StringArray::from(
            rows.iter()
                .map(|r| r.geolocation.as_deref())
                .collect::<Vec<_>>(),
        )),
    ];

    let fields: Vec<Field> = HEADERS
        .iter()
        .zip(&columns)
        .map(|(name, col)| {
            let nullable = !matches!(col.data_type(), DataType::Int64);
            Field::new(*name, col.data_type().clone(), nullable)
        })
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate(2_000, &mut rng);

    std::fs::create_dir_all("data").context("creating data directory")?;
    let csv_path = Path::new("data/sample.csv");
    let parquet_path = Path::new("data/sample.parquet");
    write_csv(&rows, csv_path)?;
    write_parquet(&rows, parquet_path)?;

    println!(
        "Wrote {} survey rows to {} and {}",
        rows.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
