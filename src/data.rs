//! Labeled example partitions
//!
//! Loading and splitting a real data set happens outside this crate; training
//! only needs three fixed matrices of examples with integer class labels.
//! Minibatches are contiguous slices taken in index order.

use crate::error::{check_len, Result, SdaError};
use crate::utils::rng::SimpleRng;

/// One contiguous minibatch borrowed from a [`LabeledSet`].
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    /// Row-major `[len × n_features]` inputs
    pub inputs: &'a [f32],
    pub labels: &'a [usize],
}

impl Batch<'_> {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A fixed-size matrix of examples with one class label per row.
#[derive(Debug, Clone)]
pub struct LabeledSet {
    inputs: Vec<f32>,
    labels: Vec<usize>,
    n_features: usize,
}

impl LabeledSet {
    /// Build a partition from flattened inputs and class indices.
    ///
    /// Fails with `ShapeMismatch` unless `inputs.len() == labels.len() * n_features`.
    pub fn new(inputs: Vec<f32>, labels: Vec<usize>, n_features: usize) -> Result<Self> {
        if n_features == 0 {
            return Err(SdaError::ShapeMismatch(
                "examples must have at least one feature".to_string(),
            ));
        }
        check_len("example matrix", labels.len() * n_features, inputs.len())?;
        Ok(Self {
            inputs,
            labels,
            n_features,
        })
    }

    /// Build a partition from labels stored as floating point values.
    ///
    /// Data sets often carry labels in the same numeric type as the features;
    /// every label must be a finite, non-negative integer value.
    pub fn from_raw_labels(inputs: Vec<f32>, raw_labels: &[f64], n_features: usize) -> Result<Self> {
        let labels = raw_labels
            .iter()
            .enumerate()
            .map(|(i, &raw)| {
                if raw.is_finite() && raw >= 0.0 && raw.fract() == 0.0 {
                    Ok(raw as usize)
                } else {
                    Err(SdaError::UnsupportedLabelType(format!(
                        "label {} of example {} is not a non-negative integer",
                        raw, i
                    )))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(inputs, labels, n_features)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn inputs(&self) -> &[f32] {
        &self.inputs
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of full minibatches; a trailing partial batch is never visited.
    pub fn n_batches(&self, batch_size: usize) -> usize {
        if batch_size == 0 {
            0
        } else {
            self.len() / batch_size
        }
    }

    /// The `index`-th minibatch of `batch_size` consecutive examples.
    ///
    /// # Panics
    ///
    /// Panics if the batch extends past the end of the partition.
    pub fn batch(&self, index: usize, batch_size: usize) -> Batch<'_> {
        let start = index * batch_size;
        let end = start + batch_size;
        assert!(end <= self.len(), "batch {} out of range", index);
        Batch {
            inputs: &self.inputs[start * self.n_features..end * self.n_features],
            labels: &self.labels[start..end],
        }
    }
}

/// Train / validation / test partitions.
#[derive(Debug, Clone)]
pub struct DataSplits {
    pub train: LabeledSet,
    pub valid: LabeledSet,
    pub test: LabeledSet,
}

impl DataSplits {
    /// Group three partitions, checking they share one feature width.
    pub fn new(train: LabeledSet, valid: LabeledSet, test: LabeledSet) -> Result<Self> {
        for (name, set) in [("validation", &valid), ("test", &test)] {
            if set.n_features() != train.n_features() {
                return Err(SdaError::ShapeMismatch(format!(
                    "{} partition has {} features, training partition has {}",
                    name,
                    set.n_features(),
                    train.n_features()
                )));
            }
        }
        Ok(Self { train, valid, test })
    }

    pub fn n_features(&self) -> usize {
        self.train.n_features()
    }

    /// Check every label of every partition is a class index below `n_out`.
    pub fn check_labels(&self, n_out: usize) -> Result<()> {
        for (name, set) in [
            ("training", &self.train),
            ("validation", &self.valid),
            ("test", &self.test),
        ] {
            if let Some(&label) = set.labels().iter().find(|&&l| l >= n_out) {
                return Err(SdaError::UnsupportedLabelType(format!(
                    "{} partition has label {} but the model has {} classes",
                    name, label, n_out
                )));
            }
        }
        Ok(())
    }
}

/// Synthetic 2-class data that a single hyperplane separates.
///
/// Features are uniform in `[0, 1]`; the class is 1 when the mean of the first
/// half of the features exceeds the mean of the second half. Examples too
/// close to the boundary are redrawn so the classes have a margin.
pub fn separable_two_class(n_examples: usize, n_features: usize, rng: &mut SimpleRng) -> Result<LabeledSet> {
    if n_features < 2 {
        return Err(SdaError::ShapeMismatch(
            "separable_two_class needs at least two features".to_string(),
        ));
    }
    let half = n_features / 2;
    let mut inputs = Vec::with_capacity(n_examples * n_features);
    let mut labels = Vec::with_capacity(n_examples);
    let mut row = vec![0.0f32; n_features];

    while labels.len() < n_examples {
        for v in row.iter_mut() {
            *v = rng.next_f32();
        }
        let left = row[..half].iter().sum::<f32>() / half as f32;
        let right = row[half..].iter().sum::<f32>() / (n_features - half) as f32;
        let margin = left - right;
        if margin.abs() < 0.05 {
            continue;
        }
        inputs.extend_from_slice(&row);
        labels.push(usize::from(margin > 0.0));
    }

    LabeledSet::new(inputs, labels, n_features)
}
