#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::pedantic)]
#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use plotters::prelude::*;
use rand::Rng;
use transpose_map::{BloomFilter, FILTER_HASHES, MapConfig, TransposeMap};

// Filter size shared by every load step
const FILTER_BITS: usize = 100_000;
// Key counts step from 20 bits per key down to 5
const NUM_STEPS: usize = 10;
const MIN_KEYS: usize = 5_000;
const MAX_KEYS: usize = 20_000;
// Negative queries per step
const PROBES: usize = 50_000;

// Entries sharing the chain of the hot key
const CHAIN_LENGTH: usize = 32;
// Background reads issued between two hot-key reads
const BACKGROUND_READS: usize = 3;
const HOT_READS: usize = 40;

/// Key hashed to a single bucket so the whole table forms one chain
#[derive(Debug, Clone, PartialEq, Eq)]
struct SharedBucket(usize);

impl Hash for SharedBucket {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(0);
    }
}

// Observed and predicted false positive rates for a growing number of keys
fn measure_false_positives() -> Vec<(usize, f64, f64)> {
    let mut rng = rand::rng();
    let mut results = Vec::with_capacity(NUM_STEPS);

    for step in 0..NUM_STEPS {
        let n_keys = MIN_KEYS + (MAX_KEYS - MIN_KEYS) * step / (NUM_STEPS - 1);
        let mut filter = BloomFilter::new(FILTER_BITS, FILTER_HASHES);
        let mut inserted = HashSet::with_capacity(n_keys);
        while inserted.len() < n_keys {
            let key: u64 = rng.random();
            if inserted.insert(key) {
                filter.insert(&key);
            }
        }

        let mut false_positives = 0;
        let mut probes = 0;
        while probes < PROBES {
            let key: u64 = rng.random();
            if inserted.contains(&key) {
                continue;
            }
            probes += 1;
            if filter.contains(&key) {
                false_positives += 1;
            }
        }

        let observed = false_positives as f64 / PROBES as f64;
        let predicted = filter.estimated_false_positive_rate(n_keys);
        println!(
            "  {n_keys} keys ({:.1} bits/key): observed {:.4}%, predicted {:.4}%",
            FILTER_BITS as f64 / n_keys as f64,
            observed * 100.0,
            predicted * 100.0
        );
        results.push((n_keys, observed, predicted));
    }

    results
}

// Chain position of a hot key after each of its reads, with random background reads
fn measure_hot_key_position() -> Vec<usize> {
    let mut rng = rand::rng();
    let config = MapConfig::default().with_initial_capacity(1).with_load_factor(f64::MAX);
    let mut map = TransposeMap::with_config(config).unwrap();
    // The hot key goes in first, so it starts at the tail
    for i in 0..CHAIN_LENGTH {
        map.insert(SharedBucket(i), i);
    }

    let hot = SharedBucket(0);
    let position = |map: &TransposeMap<SharedBucket, usize>| {
        map.keys().iter().position(|key| key == Some(&hot)).unwrap()
    };

    let mut positions = vec![position(&map)];
    for _ in 0..HOT_READS {
        for _ in 0..BACKGROUND_READS {
            let other = SharedBucket(rng.random_range(1..CHAIN_LENGTH));
            map.get(&other);
        }
        map.get(&hot);
        positions.push(position(&map));
    }

    positions
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("False positive rate of a {FILTER_BITS}-bit filter with {FILTER_HASHES} hashes:");
    let rates = measure_false_positives();

    println!("Chain position of a hot key among {CHAIN_LENGTH} colliding keys:");
    let positions = measure_hot_key_position();
    println!("  {:?}", positions);

    let font_family = "sans-serif";
    let text_size = 16;
    let title_size = 35;
    let line_width = 2;
    let marker_size = 4;

    let observed_color = RGBColor(220, 50, 50);
    let predicted_color = RGBColor(50, 90, 220);

    // Plot 1: false positive rate against key count
    let root = BitMapBackend::new("false_positive_rate.png", (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_rate = rates.iter().map(|&(_, observed, predicted)| observed.max(predicted)).fold(
        0.0,
        f64::max,
    ) * 100.0 *
        1.1; // Add 10% margin

    let mut chart = ChartBuilder::on(&root)
        .caption("Bloom Filter False Positive Rate", (font_family, title_size))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(MIN_KEYS..MAX_KEYS, 0.0..max_rate)?;

    chart
        .configure_mesh()
        .x_desc("Keys Inserted")
        .y_desc("False Positive Rate (%)")
        .axis_desc_style((font_family, text_size))
        .draw()?;

    // 1% target
    let target_style = ShapeStyle::from(&BLACK.mix(0.3)).stroke_width(1);
    chart
        .draw_series(LineSeries::new(vec![(MIN_KEYS, 1.0), (MAX_KEYS, 1.0)], target_style))?
        .label("1% target")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], target_style));

    let observed_style = ShapeStyle::from(&observed_color).stroke_width(line_width);
    chart
        .draw_series(LineSeries::new(
            rates.iter().map(|&(n, observed, _)| (n, observed * 100.0)),
            observed_style,
        ))?
        .label("Observed")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], observed_style));
    chart.draw_series(rates.iter().map(|&(n, observed, _)| {
        Circle::new((n, observed * 100.0), marker_size, observed_color.filled())
    }))?;

    let predicted_style = ShapeStyle::from(&predicted_color).stroke_width(line_width);
    chart
        .draw_series(LineSeries::new(
            rates.iter().map(|&(n, _, predicted)| (n, predicted * 100.0)),
            predicted_style,
        ))?
        .label("Predicted")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], predicted_style));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    // Plot 2: hot key position under the transpose heuristic
    let root = BitMapBackend::new("hot_key_position.png", (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Hot Key Chain Position", (font_family, title_size))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(0..HOT_READS + 1, 0..CHAIN_LENGTH)?;

    chart
        .configure_mesh()
        .x_desc("Hot Key Reads")
        .y_desc("Position in Chain (0 = head)")
        .axis_desc_style((font_family, text_size))
        .draw()?;

    chart.draw_series(LineSeries::new(
        positions.iter().copied().enumerate(),
        ShapeStyle::from(&observed_color).stroke_width(line_width),
    ))?;
    chart.draw_series(
        positions
            .iter()
            .copied()
            .enumerate()
            .map(|point| Circle::new(point, marker_size, observed_color.filled())),
    )?;

    println!("Generated plot images: false_positive_rate.png, hot_key_position.png");

    Ok(())
}
