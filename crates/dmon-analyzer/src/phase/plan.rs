use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

/// Maximum distance, in percentage points, between a phase average and its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Tolerance(f64);

impl Tolerance {
    pub const DEFAULT: Tolerance = Tolerance(15.0);

    pub fn new(points: f64) -> Result<Self, ConfigError> {
        if points.is_finite() && points >= 0.0 {
            Ok(Self(points))
        } else {
            Err(ConfigError::InvalidTolerance(points.to_string()))
        }
    }

    pub fn points(self) -> f64 {
        self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for Tolerance {
    type Error = ConfigError;

    fn try_from(points: f64) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<Tolerance> for f64 {
    fn from(tolerance: Tolerance) -> Self {
        tolerance.0
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Tolerance {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let points = raw
            .parse::<f64>()
            .map_err(|_| ConfigError::InvalidTolerance(raw.to_string()))?;
        Self::new(points)
    }
}

/// A named, half-open window `[start_index, end_index)` over accepted samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    #[serde(rename = "start")]
    pub start_index: usize,
    #[serde(rename = "end")]
    pub end_index: usize,
    #[serde(rename = "target")]
    pub target_percent: u32,
}

impl Phase {
    pub fn new(
        name: impl Into<String>,
        start_index: usize,
        end_index: usize,
        target_percent: u32,
    ) -> Self {
        Self {
            name: name.into(),
            start_index,
            end_index,
            target_percent,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_percent > 100 {
            return Err(ConfigError::TargetOutOfRange {
                name: self.name.clone(),
                target: self.target_percent,
            });
        }
        Ok(())
    }
}

/// Parses `NAME:START:END:TARGET`. The name may itself contain colons.
impl FromStr for Phase {
    type Err = ConfigError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidPhaseSpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = spec.rsplitn(4, ':');
        let target = parts.next().ok_or_else(|| invalid("missing target"))?;
        let end = parts.next().ok_or_else(|| invalid("missing end index"))?;
        let start = parts.next().ok_or_else(|| invalid("missing start index"))?;
        let name = parts
            .next()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| invalid("missing name, expected NAME:START:END:TARGET"))?;

        let phase = Phase {
            name: name.trim().to_string(),
            start_index: start
                .trim()
                .parse()
                .map_err(|_| invalid("start index is not a non-negative integer"))?,
            end_index: end
                .trim()
                .parse()
                .map_err(|_| invalid("end index is not a non-negative integer"))?,
            target_percent: target
                .trim()
                .trim_end_matches('%')
                .parse()
                .map_err(|_| invalid("target is not a non-negative integer"))?,
        };
        phase.validate()?;
        Ok(phase)
    }
}

/// Phases plus the tolerance they are judged with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhasePlan {
    #[serde(default)]
    pub tolerance: Tolerance,
    pub phases: Vec<Phase>,
}

impl PhasePlan {
    pub fn new(phases: Vec<Phase>, tolerance: Tolerance) -> Self {
        Self { tolerance, phases }
    }

    /// Windows for the two-step limit test: the 30% annotation is applied when
    /// logging starts and the 80% one about 40 s later, each followed by ~10 s
    /// of detection lag. Samples are assumed to arrive at 1 Hz.
    pub fn builtin() -> Self {
        Self {
            tolerance: Tolerance::DEFAULT,
            phases: vec![
                Phase::new("Step 1 (30%)", 15, 35, 30),
                Phase::new("Step 2 (80%)", 55, 75, 80),
            ],
        }
    }

    pub fn from_yaml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let plan: PhasePlan =
            serde_yaml::from_str(text).map_err(|source| ConfigError::PlanParse {
                path: origin.to_path_buf(),
                source,
            })?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::PlanRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.phases.iter().try_for_each(Phase::validate)
    }
}

impl Default for PhasePlan {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn phase_from_cli_value() {
        let phase: Phase = "Step 1 (30%):15:35:30".parse().unwrap();

        assert_eq!(phase, Phase::new("Step 1 (30%)", 15, 35, 30));
    }

    #[test]
    fn phase_name_may_contain_colons() {
        let phase: Phase = "limit: 80%:55:75:80%".parse().unwrap();

        assert_eq!(phase, Phase::new("limit: 80%", 55, 75, 80));
    }

    #[test]
    fn phase_value_rejects_garbage() {
        assert!(matches!(
            "15:35:30".parse::<Phase>(),
            Err(ConfigError::InvalidPhaseSpec { .. })
        ));
        assert!(matches!(
            "a:x:35:30".parse::<Phase>(),
            Err(ConfigError::InvalidPhaseSpec { .. })
        ));
        assert!(matches!(
            "a:1:-2:30".parse::<Phase>(),
            Err(ConfigError::InvalidPhaseSpec { .. })
        ));
        assert!(matches!(
            "a:1:2:130".parse::<Phase>(),
            Err(ConfigError::TargetOutOfRange { target: 130, .. })
        ));
    }

    #[test]
    fn tolerance_validation() {
        assert_eq!(Tolerance::new(0.0).unwrap().points(), 0.0);
        assert_eq!("7.5".parse::<Tolerance>().unwrap().points(), 7.5);
        assert!(Tolerance::new(-1.0).is_err());
        assert!(Tolerance::new(f64::INFINITY).is_err());
        assert!("abc".parse::<Tolerance>().is_err());
    }

    #[test]
    fn tolerance_error_shows_input() {
        let err = "abc".parse::<Tolerance>().unwrap_err();
        assert!(matches!(&err, ConfigError::InvalidTolerance(raw) if raw == "abc"));
        assert!(err.to_string().contains("`abc`"));

        let err = Tolerance::new(-2.5).unwrap_err();
        assert!(err.to_string().contains("`-2.5`"));
    }

    #[test]
    fn plan_from_yaml() {
        let yaml = r#"
tolerance: 10
phases:
  - name: "Step 1 (30%)"
    start: 15
    end: 35
    target: 30
  - name: idle
    start: 0
    end: 10
    target: 100
"#;
        let plan = PhasePlan::from_yaml_str(yaml, Path::new("plan.yaml")).unwrap();

        assert_eq!(plan.tolerance.points(), 10.0);
        assert_eq!(
            plan.phases,
            vec![
                Phase::new("Step 1 (30%)", 15, 35, 30),
                Phase::new("idle", 0, 10, 100),
            ]
        );
    }

    #[test]
    fn plan_tolerance_defaults() {
        let yaml = "phases:\n  - {name: a, start: 0, end: 5, target: 50}\n";
        let plan = PhasePlan::from_yaml_str(yaml, Path::new("plan.yaml")).unwrap();

        assert_eq!(plan.tolerance, Tolerance::DEFAULT);
    }

    #[test]
    fn plan_rejects_bad_values() {
        let negative = "tolerance: -3\nphases: []\n";
        assert!(matches!(
            PhasePlan::from_yaml_str(negative, Path::new("p.yaml")),
            Err(ConfigError::PlanParse { .. })
        ));

        let target = "phases:\n  - {name: a, start: 0, end: 5, target: 150}\n";
        assert!(matches!(
            PhasePlan::from_yaml_str(target, Path::new("p.yaml")),
            Err(ConfigError::TargetOutOfRange { .. })
        ));
    }

    #[test]
    fn shipped_plan_matches_builtin() {
        let yaml = include_str!("../../plans/two-step.yaml");
        let plan = PhasePlan::from_yaml_str(yaml, Path::new("two-step.yaml")).unwrap();

        assert_eq!(plan, PhasePlan::builtin());
    }

    #[test]
    fn builtin_plan() {
        let plan = PhasePlan::builtin();

        assert_eq!(plan.tolerance.points(), 15.0);
        assert_eq!(plan.phases.len(), 2);
        assert_eq!(plan.phases[1], Phase::new("Step 2 (80%)", 55, 75, 80));
    }
}
