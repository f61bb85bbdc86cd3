use anyhow::{Context, Result};

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

    /// Uniform in [0, 1).
    fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform in [lo, hi).
    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.uniform()
    }
}

const PROVINCES: &[(&str, &str)] = &[
    ("All Provinces", "CAN"),
    ("Alberta", "AB"),
    ("British Columbia", "BC"),
    ("Ontario", "ON"),
    ("Quebec", "QC"),
];

const ITEMS: &[&str] = &[
    "Total Income Assessed",
    "Net Income",
    "Taxable Income",
    "Total Tax Payable",
];

const YEARS: &[i32] = &[2015, 2016, 2017, 2018, 2019];

/// Percentile cut-points of the published table: 5%-wide bins plus the
/// interpolated 99th cut-point.
fn pce_cutpoints() -> Vec<u8> {
    let mut cuts: Vec<u8> = (0..=95).step_by(5).map(|p| p as u8).collect();
    cuts.push(99);
    cuts
}

/// Concentration exponent controls how top-heavy the distribution is.
/// Cumulative share below cut-point p is (p/100)^k with k > 1.
fn share_below(pce: u8, k: f64) -> f64 {
    (f64::from(pce) / 100.0).powf(k)
}

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "t1-sample.csv".to_string());

    let mut rng = SimpleRng::new(20190415);
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("creating {path}"))?;

    writer.write_record([
        "year",
        "provname",
        "provabb",
        "item",
        "pce",
        "quintile",
        "binshr",
        "ipoltshr",
        "ipolshr",
        "realdol",
        "avgrealdol",
    ])?;

    let cuts = pce_cutpoints();
    let mut rows = 0usize;

    for (provname, provabb) in PROVINCES {
        for item in ITEMS {
            // Each province × item gets its own concentration and scale.
            let k = rng.range(1.6, 2.6);
            let total_dollars = rng.range(5.0e9, 4.0e11);
            let total_filers = rng.range(5.0e5, 1.5e7);

            for &year in YEARS {
                let drift = 1.0 + 0.01 * f64::from(year - YEARS[0]);

                // -- percentile rows --
                for (i, &pce) in cuts.iter().enumerate() {
                    let below = share_below(pce, k * drift);
                    let above = 1.0 - below;
                    let next_below = cuts
                        .get(i + 1)
                        .map(|&n| share_below(n, k * drift))
                        .unwrap_or(1.0);
                    let binshr = next_below - below;

                    let realdol = above * total_dollars;
                    let filers_above = total_filers * (1.0 - f64::from(pce) / 100.0);
                    let avgrealdol = if filers_above > 0.0 {
                        realdol / filers_above
                    } else {
                        0.0
                    };

                    writer.write_record([
                        year.to_string(),
                        provname.to_string(),
                        provabb.to_string(),
                        item.to_string(),
                        pce.to_string(),
                        String::new(),
                        format!("{binshr:.6}"),
                        format!("{above:.6}"),
                        format!("{below:.6}"),
                        format!("{realdol:.0}"),
                        format!("{avgrealdol:.2}"),
                    ])?;
                    rows += 1;
                }

                // -- quintile rows --
                for quintile in 1u8..=5 {
                    let lower = (quintile - 1) * 20;
                    let upper = quintile * 20;
                    let binshr =
                        share_below(upper, k * drift) - share_below(lower, k * drift);
                    writer.write_record([
                        year.to_string(),
                        provname.to_string(),
                        provabb.to_string(),
                        item.to_string(),
                        String::new(),
                        quintile.to_string(),
                        format!("{binshr:.6}"),
                        String::new(),
                        String::new(),
                        String::new(),
                        String::new(),
                    ])?;
                    rows += 1;
                }
            }
        }
    }

    writer.flush()?;
    println!("wrote {rows} rows to {path}");
    Ok(())
}
