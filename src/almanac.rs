use anyhow::{anyhow, bail, Context, Result};
use camino::Utf8Path as Path;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, instrument};

use crate::{
    error::SearchError,
    mapping::{MappingPipeline, RangeMap, Rule, Value},
    types::interval::SeedInterval,
};

/// Parsed search input: the seed list and the remap chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Almanac {
    pub seeds: Vec<Value>,
    pub pipeline: MappingPipeline,
}

impl Almanac {
    #[instrument(err)]
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Couldn't read input '{path}'"))?;
        let almanac: Almanac = text
            .parse()
            .with_context(|| format!("Invalid input '{path}'"))?;
        debug!(
            "Loaded {} seeds and {} stages",
            almanac.seeds.len(),
            almanac.pipeline.stages().len()
        );
        Ok(almanac)
    }

    /// Seeds read as `(start, count)` pairs.
    pub fn seed_intervals(&self) -> Result<Vec<SeedInterval>, SearchError> {
        parse_seed_intervals(&self.seeds)
    }
}

impl std::str::FromStr for Almanac {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut lines = s.lines().enumerate();
        let (_, first) = lines.next().ok_or_else(|| anyhow!("Input is empty"))?;
        let seeds = parse_seeds_line(first).context("line 1")?;
        let pipeline = parse_mapping_pipeline(lines)?;
        Ok(Self { seeds, pipeline })
    }
}

fn parse_seeds_line(line: &str) -> Result<Vec<Value>> {
    let rest = line
        .trim()
        .strip_prefix("seeds:")
        .ok_or_else(|| anyhow!("Expected 'seeds:' header, got '{line}'"))?;
    rest.split_whitespace()
        .map(|s| s.parse().with_context(|| format!("Invalid seed '{s}'")))
        .collect()
}

pub fn parse_seed_intervals(seeds: &[Value]) -> Result<Vec<SeedInterval>, SearchError> {
    if seeds.len() % 2 != 0 {
        return Err(SearchError::invalid_config(format!(
            "seeds must come in (start, count) pairs, got {} numbers",
            seeds.len()
        )));
    }
    seeds
        .chunks_exact(2)
        .map(|pair| SeedInterval::new(pair[0], pair[1]))
        .collect()
}

/// Parses the stage blocks that follow the seeds line. Takes numbered lines so
/// errors can point at the offending line.
pub fn parse_mapping_pipeline<'a>(
    lines: impl Iterator<Item = (usize, &'a str)>,
) -> Result<MappingPipeline> {
    lazy_static! {
        static ref HEADER: Regex = Regex::new(r"^(\S+)\s+map:$").unwrap();
    }
    let mut stages = Vec::new();
    let mut current: Option<(String, Vec<Rule>)> = None;
    for (index, line) in lines {
        let line = line.trim();
        let lineno = index + 1;
        if line.is_empty() {
            if let Some((name, rules)) = current.take() {
                stages.push(RangeMap::new(name, rules));
            }
            continue;
        }
        if let Some(cap) = HEADER.captures(line) {
            if let Some((name, rules)) = current.take() {
                stages.push(RangeMap::new(name, rules));
            }
            current = Some((cap[1].to_owned(), Vec::new()));
            continue;
        }
        let Some((_, rules)) = current.as_mut() else {
            bail!("line {lineno}: rule outside of a map block: '{line}'");
        };
        rules.push(parse_rule(line).with_context(|| format!("line {lineno}"))?);
    }
    if let Some((name, rules)) = current.take() {
        stages.push(RangeMap::new(name, rules));
    }
    Ok(MappingPipeline::new(stages))
}

fn parse_rule(line: &str) -> Result<Rule> {
    let numbers = line
        .split_whitespace()
        .map(|s| s.parse::<Value>().with_context(|| format!("Invalid number '{s}'")))
        .collect::<Result<Vec<_>>>()?;
    let [destination, source, length] = numbers.as_slice() else {
        bail!("Expected 'destination source length', got '{line}'");
    };
    Ok(Rule::new(*destination, *source, *length)?)
}
