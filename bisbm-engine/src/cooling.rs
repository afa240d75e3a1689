//! Cooling-schedule configuration for the MCMC/KL engine: enumerated
//! schedule kinds (`exponential`, `logarithmic`, `linear`, `constant`,
//! `abrupt_cool`), each taking one or two scalar parameters.

use bisbm_types::{BisbmError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoolingKind {
    Exponential,
    Logarithmic,
    Linear,
    Constant,
    AbruptCool,
}

impl CoolingKind {
    /// Number of scalar parameters this schedule kind takes:
    /// `exponential`, `logarithmic`, and `linear` take two; `constant`
    /// and `abrupt_cool` take one.
    pub fn param_count(self) -> usize {
        match self {
            CoolingKind::Exponential | CoolingKind::Logarithmic | CoolingKind::Linear => 2,
            CoolingKind::Constant | CoolingKind::AbruptCool => 1,
        }
    }

    pub fn as_flag(self) -> &'static str {
        match self {
            CoolingKind::Exponential => "exponential",
            CoolingKind::Logarithmic => "logarithmic",
            CoolingKind::Linear => "linear",
            CoolingKind::Constant => "constant",
            CoolingKind::AbruptCool => "abrupt_cool",
        }
    }
}

/// A validated `(kind, params)` pair, rejecting a parameter count
/// that doesn't match the kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoolingSchedule {
    pub kind: CoolingKind,
    pub param_1: f64,
    pub param_2: Option<f64>,
}

impl CoolingSchedule {
    pub fn new(kind: CoolingKind, param_1: f64, param_2: Option<f64>) -> Result<Self> {
        let expected = kind.param_count();
        let got = if param_2.is_some() { 2 } else { 1 };
        if got != expected {
            return Err(BisbmError::InvalidInput(format!(
                "cooling schedule {:?} expects {expected} parameter(s), got {got}",
                kind
            )));
        }
        Ok(Self {
            kind,
            param_1,
            param_2,
        })
    }

    /// Renders the `-a <params>` argument as a space-joined `"p1 p2"`
    /// or single `"p1"`, per the parameter count the kind expects.
    pub fn params_arg(&self) -> String {
        match self.param_2 {
            Some(p2) => format!("{} {}", self.param_1, p2),
            None => format!("{}", self.param_1),
        }
    }
}
