//! Batch dispatch: one template, N substitutions
//!
//! A request is a batch when any value is a sequence longer than one. All such
//! sequences must share one length N; scalars and length-1 sequences are
//! repeated for each of the N entries.

use std::path::Path;

use tracing::info;

use crate::error::{Result, SubError};
use crate::request::{Scalar, ScalarRequest, SubValue, SubstitutionRequest};
use crate::runner::SimulationRunner;
use crate::substitutor::{SubstitutionOutput, Substitutor};

/// One result or an ordered batch of results
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch<T> {
    Single(T),
    Batch(Vec<T>),
}

impl<T> Dispatch<T> {
    pub fn is_batch(&self) -> bool {
        matches!(self, Self::Batch(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Batch(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Single(item) => vec![item],
            Self::Batch(items) => items,
        }
    }

    pub fn try_map<U, E, F>(self, mut f: F) -> std::result::Result<Dispatch<U>, E>
    where
        F: FnMut(T) -> std::result::Result<U, E>,
    {
        Ok(match self {
            Self::Single(item) => Dispatch::Single(f(item)?),
            Self::Batch(items) => {
                Dispatch::Batch(items.into_iter().map(f).collect::<std::result::Result<_, _>>()?)
            }
        })
    }
}

/// Common length of the sequences longer than one, if there are any.
pub fn batch_size(request: &SubstitutionRequest) -> Result<Option<usize>> {
    let mut size: Option<usize> = None;

    for (key, value) in request.iter() {
        if let Some(len) = value.seq_len().filter(|len| *len > 1) {
            match size {
                None => size = Some(len),
                Some(expected) if expected != len => {
                    return Err(SubError::InconsistentBatchSize {
                        key: key.clone(),
                        expected,
                        found: len,
                    })
                }
                Some(_) => {}
            }
        }
    }

    // Once a batch exists, every other sequence must broadcast (length 1)
    if let Some(expected) = size {
        for (key, value) in request.iter() {
            if let Some(found) = value.seq_len().filter(|len| *len != 1 && *len != expected) {
                return Err(SubError::InconsistentBatchSize {
                    key: key.clone(),
                    expected,
                    found,
                });
            }
        }
    }

    Ok(size)
}

/// Split `request` into the scalar requests that would be processed.
///
/// Fails before anything runs if the batch is inconsistent.
pub fn plan(request: &SubstitutionRequest) -> Result<Dispatch<ScalarRequest>> {
    let Some(n) = batch_size(request)? else {
        return Ok(Dispatch::Single(request.normalize()?));
    };

    let entries = (0..n)
        .map(|i| {
            request
                .iter()
                .map(|(key, value)| (key.clone(), element(value, i)))
                .collect::<ScalarRequest>()
        })
        .collect();

    Ok(Dispatch::Batch(entries))
}

fn element(value: &SubValue, i: usize) -> Scalar {
    match value {
        SubValue::Scalar(s) => s.clone(),
        SubValue::Seq(values) if values.len() == 1 => values[0].clone(),
        SubValue::Seq(values) => values[i].clone(),
    }
}

impl<R: SimulationRunner> Substitutor<R> {
    /// Substitute `request` into `template`, once or once per batch entry.
    ///
    /// Entries are processed sequentially, in order; the first failure aborts.
    pub fn dispatch(
        &self,
        template: &Path,
        weather: Option<&Path>,
        request: &SubstitutionRequest,
        verbose: bool,
    ) -> Result<Dispatch<SubstitutionOutput>> {
        let planned = plan(request)?;
        let total = planned.len();
        if planned.is_batch() {
            info!(total, template = %template.display(), "Dispatching batch");
        }

        let mut index = 0;
        planned.try_map(|entry| {
            index += 1;
            if total > 1 {
                info!(entry = index, total, "Processing batch entry");
            }
            self.substitute_scalar(template, weather, &entry, verbose)
        })
    }
}
