use super::{DatasetBase, Records};
use ndarray::{ArrayBase, ArrayView2, Data, Ix2};

impl<R: Records, T> DatasetBase<R, T> {
    /// Create a new dataset from records and targets
    pub fn new(records: R, targets: T) -> DatasetBase<R, T> {
        DatasetBase {
            records,
            targets,
            feature_names: Vec::new(),
        }
    }

    /// Returns reference to records
    pub fn records(&self) -> &R {
        &self.records
    }

    /// Returns reference to targets
    pub fn targets(&self) -> &T {
        &self.targets
    }

    /// Number of samples in the dataset
    pub fn nsamples(&self) -> usize {
        self.records.nsamples()
    }

    /// Number of features of each sample
    pub fn nfeatures(&self) -> usize {
        self.records.nfeatures()
    }

    /// Returns feature names
    ///
    /// A feature name gives a human-readable string describing the purpose of a single feature.
    /// If no names were attached, placeholders of the form `feature-{idx}` are returned.
    pub fn feature_names(&self) -> Vec<String> {
        if !self.feature_names.is_empty() {
            self.feature_names.clone()
        } else {
            (0..self.records.nfeatures())
                .map(|idx| format!("feature-{}", idx))
                .collect()
        }
    }

    /// Updates the records of a dataset
    ///
    /// This function overwrites the records in a dataset. It also invalidates the feature names.
    pub fn with_records<R2: Records>(self, records: R2) -> DatasetBase<R2, T> {
        DatasetBase {
            records,
            targets: self.targets,
            feature_names: Vec::new(),
        }
    }

    /// Updates the targets of a dataset
    pub fn with_targets<T2>(self, targets: T2) -> DatasetBase<R, T2> {
        DatasetBase {
            records: self.records,
            targets,
            feature_names: self.feature_names,
        }
    }

    /// Sets the feature names
    pub fn with_feature_names<I: Into<String>>(mut self, names: Vec<I>) -> DatasetBase<R, T> {
        self.feature_names = names.into_iter().map(|x| x.into()).collect();
        self
    }
}

impl<F, D: Data<Elem = F>, T> DatasetBase<ArrayBase<D, Ix2>, T> {
    /// Creates a view of the records, keeping targets by reference
    pub fn view(&self) -> DatasetBase<ArrayView2<'_, F>, &T> {
        DatasetBase {
            records: self.records.view(),
            targets: &self.targets,
            feature_names: self.feature_names.clone(),
        }
    }
}

impl<F, D: Data<Elem = F>> From<ArrayBase<D, Ix2>> for DatasetBase<ArrayBase<D, Ix2>, ()> {
    fn from(records: ArrayBase<D, Ix2>) -> Self {
        DatasetBase {
            records,
            targets: (),
            feature_names: Vec::new(),
        }
    }
}

impl<R: Records, T> From<(R, T)> for DatasetBase<R, T> {
    fn from((records, targets): (R, T)) -> Self {
        DatasetBase::new(records, targets)
    }
}
