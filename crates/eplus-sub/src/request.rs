//! Substitution requests: which field of which object gets which value

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, SubError};

/// Address of one field inside an IDF object definition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
    /// Object type token, e.g. `Schedule:Compact`
    pub object: String,
    /// Instance name, e.g. `HTGSETP_SCH_NO_OPTIMUM`
    pub name: String,
    /// Field name as written after `!-`
    pub field: String,
}

impl FieldKey {
    pub fn new(object: impl Into<String>, name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            name: name.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.object, self.name, self.field)
    }
}

/// A single substitutable value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Infer the scalar type of a command-line token: bool, integer, float, then string.
    pub fn infer(token: &str) -> Self {
        let token = token.trim();
        match token {
            "true" | "True" => return Self::Bool(true),
            "false" | "False" => return Self::Bool(false),
            _ => {}
        }
        if let Ok(i) = token.parse::<i64>() {
            return Self::Int(i);
        }
        match token.parse::<f64>() {
            Ok(f) if f.is_finite() => Self::Float(f),
            _ => Self::Str(token.to_string()),
        }
    }

    fn from_json(key: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Ok(Self::Int(i)),
                (None, Some(f)) => Ok(Self::Float(f)),
                _ => Err(invalid(key, format!("unrepresentable number {n}"))),
            },
            Value::String(s) => Ok(Self::Str(s.clone())),
            Value::Null => Err(invalid(key, "null is not a scalar")),
            Value::Array(_) => Err(invalid(key, "nested sequences are not allowed")),
            Value::Object(_) => Err(invalid(key, "tables are not scalars")),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            // Integral floats keep their decimal point: 22.0, not 22
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{v:.1}")
            }
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Scalar {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

/// Requested value for a field: one scalar or a sequence (a batch column)
#[derive(Debug, Clone, PartialEq)]
pub enum SubValue {
    Scalar(Scalar),
    Seq(Vec<Scalar>),
}

impl SubValue {
    /// Length of a sequence value, `None` for scalars
    pub fn seq_len(&self) -> Option<usize> {
        match self {
            Self::Scalar(_) => None,
            Self::Seq(values) => Some(values.len()),
        }
    }
}

macro_rules! sub_value_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for SubValue {
                fn from(value: $ty) -> Self {
                    Self::Scalar(value.into())
                }
            }

            impl From<Vec<$ty>> for SubValue {
                fn from(values: Vec<$ty>) -> Self {
                    Self::Seq(values.into_iter().map(Into::into).collect())
                }
            }
        )*
    };
}

sub_value_from!(bool, i64, i32, f64, &str, String);

impl From<Scalar> for SubValue {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<Scalar>> for SubValue {
    fn from(values: Vec<Scalar>) -> Self {
        Self::Seq(values)
    }
}

/// Ordered mapping of field addresses to requested values.
///
/// Insertion order is the order substitutions are applied in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubstitutionRequest {
    entries: IndexMap<FieldKey, SubValue>,
}

/// A request holding scalar values only
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarRequest {
    entries: IndexMap<FieldKey, Scalar>,
}

/// On-disk request layout: a list of `[[field]]` tables
#[derive(Debug, Deserialize)]
struct RequestFile {
    #[serde(default)]
    field: Vec<RequestEntry>,
}

#[derive(Debug, Deserialize)]
struct RequestEntry {
    object: String,
    name: String,
    field: String,
    value: Value,
}

impl SubstitutionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(
        mut self,
        object: impl Into<String>,
        name: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<SubValue>,
    ) -> Self {
        self.insert(FieldKey::new(object, name, field), value.into());
        self
    }

    /// Insert or replace an entry; a replaced key keeps its original position
    pub fn insert(&mut self, key: FieldKey, value: SubValue) -> Option<SubValue> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &FieldKey) -> Option<&SubValue> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &SubValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge `other` into `self`, later entries winning
    pub fn extend(&mut self, other: SubstitutionRequest) {
        self.entries.extend(other.entries);
    }

    /// Unwrap length-1 sequences; reject every other sequence.
    pub fn normalize(&self) -> Result<ScalarRequest> {
        let mut entries = IndexMap::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            let scalar = match value {
                SubValue::Scalar(s) => s.clone(),
                SubValue::Seq(values) if values.len() == 1 => values[0].clone(),
                SubValue::Seq(values) => {
                    return Err(SubError::InvalidScalarValue {
                        key: key.to_string(),
                        reason: format!("expected a scalar, got a sequence of {}", values.len()),
                    })
                }
            };
            entries.insert(key.clone(), scalar);
        }
        Ok(ScalarRequest { entries })
    }

    /// Load a request file; `.json` is JSON, anything else TOML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SubError::io(path, e))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: RequestFile =
            toml::from_str(content).map_err(|e| SubError::Parse(format!("request: {e}")))?;
        Self::from_file(file)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: RequestFile =
            serde_json::from_str(content).map_err(|e| SubError::Parse(format!("request: {e}")))?;
        Self::from_file(file)
    }

    /// Parse `OBJECT|NAME|FIELD=V1[,V2...]` assignments.
    pub fn from_assignments<I, S>(assignments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut request = Self::new();
        for assignment in assignments {
            let (key, value) = parse_assignment(assignment.as_ref())?;
            request.insert(key, value);
        }
        Ok(request)
    }

    fn from_file(file: RequestFile) -> Result<Self> {
        let mut request = Self::new();
        for entry in file.field {
            let key = FieldKey::new(entry.object, entry.name, entry.field);
            let label = key.to_string();
            let value = match &entry.value {
                Value::Array(items) => SubValue::Seq(
                    items
                        .iter()
                        .map(|item| Scalar::from_json(&label, item))
                        .collect::<Result<_>>()?,
                ),
                other => SubValue::Scalar(Scalar::from_json(&label, other)?),
            };
            request.insert(key, value);
        }
        Ok(request)
    }
}

impl FromIterator<(FieldKey, SubValue)> for SubstitutionRequest {
    fn from_iter<I: IntoIterator<Item = (FieldKey, SubValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl ScalarRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: FieldKey, value: Scalar) -> Option<Scalar> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &FieldKey) -> Option<&Scalar> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &Scalar)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(FieldKey, Scalar)> for ScalarRequest {
    fn from_iter<I: IntoIterator<Item = (FieldKey, Scalar)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl From<ScalarRequest> for SubstitutionRequest {
    fn from(request: ScalarRequest) -> Self {
        request
            .entries
            .into_iter()
            .map(|(k, v)| (k, SubValue::Scalar(v)))
            .collect()
    }
}

fn parse_assignment(assignment: &str) -> Result<(FieldKey, SubValue)> {
    let bad = |why: &str| SubError::Parse(format!("assignment '{assignment}': {why}"));

    let (key, values) = assignment
        .split_once('=')
        .ok_or_else(|| bad("expected OBJECT|NAME|FIELD=VALUE"))?;

    let parts: Vec<&str> = key.split('|').map(str::trim).collect();
    let [object, name, field] = parts.as_slice() else {
        return Err(bad("key must have exactly three '|'-separated parts"));
    };
    if object.is_empty() || name.is_empty() || field.is_empty() {
        return Err(bad("empty key part"));
    }

    let mut scalars: Vec<Scalar> = values.split(',').map(Scalar::infer).collect();
    let value = if scalars.len() == 1 {
        SubValue::Scalar(scalars.remove(0))
    } else {
        SubValue::Seq(scalars)
    };

    Ok((FieldKey::new(*object, *name, *field), value))
}

fn invalid(key: &str, reason: impl Into<String>) -> SubError {
    SubError::InvalidScalarValue {
        key: key.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Float(22.0).to_string(), "22.0");
        assert_eq!(Scalar::Float(21.5).to_string(), "21.5");
        assert_eq!(Scalar::Float(-0.25).to_string(), "-0.25");
        assert_eq!(Scalar::Int(7).to_string(), "7");
        assert_eq!(Scalar::Bool(true).to_string(), "True");
        assert_eq!(Scalar::Bool(false).to_string(), "False");
        assert_eq!(Scalar::from("autosize").to_string(), "autosize");
    }

    #[test]
    fn test_scalar_inference() {
        assert_eq!(Scalar::infer("true"), Scalar::Bool(true));
        assert_eq!(Scalar::infer("False"), Scalar::Bool(false));
        assert_eq!(Scalar::infer(" 12 "), Scalar::Int(12));
        assert_eq!(Scalar::infer("12.5"), Scalar::Float(12.5));
        assert_eq!(Scalar::infer("autosize"), Scalar::Str("autosize".into()));
        assert_eq!(Scalar::infer("inf"), Scalar::Str("inf".into()));
    }

    #[test]
    fn test_normalize_unwraps_singletons() {
        let request = SubstitutionRequest::new()
            .with("Schedule:Compact", "A", "Field 6", vec![21.0])
            .with("Schedule:Compact", "B", "Field 6", 19);

        let scalar = request.normalize().unwrap();
        assert_eq!(scalar.len(), 2);
        assert_eq!(
            scalar.get(&FieldKey::new("Schedule:Compact", "A", "Field 6")),
            Some(&Scalar::Float(21.0))
        );
    }

    #[test]
    fn test_normalize_rejects_sequences() {
        let request = SubstitutionRequest::new().with("Zone", "Z1", "Multiplier", vec![1, 2]);
        let err = request.normalize().unwrap_err();
        assert!(matches!(err, SubError::InvalidScalarValue { .. }));

        let empty: Vec<i64> = Vec::new();
        let request = SubstitutionRequest::new().with("Zone", "Z1", "Multiplier", empty);
        assert!(matches!(
            request.normalize(),
            Err(SubError::InvalidScalarValue { .. })
        ));
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let request = SubstitutionRequest::new()
            .with("B", "b", "f", 1)
            .with("A", "a", "f", 2)
            .with("B", "b", "f", 3);

        let keys: Vec<_> = request.iter().map(|(k, _)| k.object.clone()).collect();
        assert_eq!(keys, vec!["B", "A"]);
        assert_eq!(
            request.get(&FieldKey::new("B", "b", "f")),
            Some(&SubValue::Scalar(Scalar::Int(3)))
        );
    }

    #[test]
    fn test_toml_request() {
        let request = SubstitutionRequest::from_toml_str(
            r#"
            [[field]]
            object = "Schedule:Compact"
            name = "HTGSETP_SCH_NO_OPTIMUM"
            field = "Field 6"
            value = [20.0, 21.0, 22.0]

            [[field]]
            object = "Building"
            name = "Office"
            field = "North Axis"
            value = 15
            "#,
        )
        .unwrap();

        assert_eq!(request.len(), 2);
        let (key, value) = request.iter().next().unwrap();
        assert_eq!(key.name, "HTGSETP_SCH_NO_OPTIMUM");
        assert_eq!(value.seq_len(), Some(3));
    }

    #[test]
    fn test_json_request_rejects_tables() {
        let err = SubstitutionRequest::from_json_str(
            r#"{"field": [{"object": "Zone", "name": "Z1", "field": "X", "value": {"a": 1}}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SubError::InvalidScalarValue { .. }));

        let err = SubstitutionRequest::from_json_str(
            r#"{"field": [{"object": "Zone", "name": "Z1", "field": "X", "value": [[1], [2]]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SubError::InvalidScalarValue { .. }));
    }

    #[test]
    fn test_json_request_values() {
        let request = SubstitutionRequest::from_json_str(
            r#"{"field": [{"object": "Zone", "name": "Z1", "field": "Part of Total Floor Area", "value": [true]}]}"#,
        )
        .unwrap();
        let scalar = request.normalize().unwrap();
        let (_, value) = scalar.iter().next().unwrap();
        assert_eq!(value.to_string(), "True");

        let err = SubstitutionRequest::from_json_str(
            r#"{"field": [{"object": "Zone", "name": "Z1", "field": "X", "value": null}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SubError::InvalidScalarValue { .. }));
    }

    #[test]
    fn test_assignments() {
        let request = SubstitutionRequest::from_assignments([
            "Schedule:Compact|HTGSETP_SCH_NO_OPTIMUM|Field 6=20.0,22.0",
            "Building|Office|Terrain=City",
        ])
        .unwrap();

        let values: Vec<_> = request.iter().map(|(_, v)| v.clone()).collect();
        assert_eq!(values[0], SubValue::from(vec![20.0, 22.0]));
        assert_eq!(values[1], SubValue::from("City"));
    }

    #[test]
    fn test_bad_assignments() {
        assert!(SubstitutionRequest::from_assignments(["no equals sign"]).is_err());
        assert!(SubstitutionRequest::from_assignments(["A|B=1"]).is_err());
        assert!(SubstitutionRequest::from_assignments(["A||C=1"]).is_err());
    }
}
