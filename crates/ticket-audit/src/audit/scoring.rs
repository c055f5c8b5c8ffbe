use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use super::config::ScoringPolicy;
use super::outcome::Outcome;
use super::rules::RuleId;

/// Band a completion score falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreCategory {
    Below75,
    From75To90,
    Above90,
}

impl ScoreCategory {
    pub fn for_score(score: u32) -> Self {
        if score < 75 {
            ScoreCategory::Below75
        } else if score < 90 {
            ScoreCategory::From75To90
        } else {
            ScoreCategory::Above90
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreCategory::Below75 => "<75%",
            ScoreCategory::From75To90 => "75%-90%",
            ScoreCategory::Above90 => ">90%-100%",
        }
    }
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ScoreCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

fn ceil_percent(earned: u32, possible: u32) -> u32 {
    if possible == 0 {
        return 0;
    }
    (earned * 100).div_ceil(possible)
}

/// Share of applicable scoring rules the ticket passed, rounded up.
pub fn completion_score<'a, I>(verdicts: I, policy: &ScoringPolicy) -> u32
where
    I: IntoIterator<Item = (RuleId, &'a Outcome)>,
{
    let (passed, applicable) = verdicts
        .into_iter()
        .filter(|(rule, _)| rule.is_scored())
        .filter_map(|(_, outcome)| outcome.scoring_value(policy))
        .fold((0u32, 0u32), |(passed, applicable), pass| {
            (passed + u32::from(pass), applicable + 1)
        });
    ceil_percent(passed, applicable)
}

/// Weighted share over rules with a positive weight and a Pass/Fail verdict.
pub fn weighted_score<'a, I>(
    verdicts: I,
    weights: &BTreeMap<RuleId, u32>,
    policy: &ScoringPolicy,
) -> u32
where
    I: IntoIterator<Item = (RuleId, &'a Outcome)>,
{
    let (earned, possible) = verdicts
        .into_iter()
        .filter_map(|(rule, outcome)| {
            let weight = weights.get(&rule).copied().filter(|weight| *weight > 0)?;
            outcome.scoring_value(policy).map(|pass| (weight, pass))
        })
        .fold((0u32, 0u32), |(earned, possible), (weight, pass)| {
            (earned + if pass { weight } else { 0 }, possible + weight)
        });
    ceil_percent(earned, possible)
}
