//! Exploration index data attached to each node.
//!
//! One variant is chosen once per search. The depth-extended flavour is
//! not a separate variant: it is the optional `max_depth_descendants`
//! counter layered next to the base data and maintained by the update
//! scheduler.

use serde::{Deserialize, Serialize};

use crate::utils::interval::Interval;

/// Which priority function annotates nodes during a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexComputation {
    MinGlobalChange,
    MinLocalChange,
    RecurZipf,
}

/// Variant-specific exploration data. `index` is "smaller is better", a
/// lower bound on the amount of value change needed for the node to become
/// best. The root always carries index 0.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexVariantData {
    MinGlobal {
        index: Option<f64>,
        min_path_value: Option<f64>,
        max_path_value: Option<f64>,
    },
    MinLocal {
        index: Option<f64>,
        interval: Option<Interval>,
    },
    RecurZipf {
        index: Option<f64>,
        zipf_factored_proba: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexData {
    pub variant: IndexVariantData,
    /// Present only in the depth-extended flavour.
    pub max_depth_descendants: Option<usize>,
}

impl IndexData {
    pub fn new(computation: IndexComputation, depth_extended: bool) -> Self {
        let variant = match computation {
            IndexComputation::MinGlobalChange => IndexVariantData::MinGlobal {
                index: None,
                min_path_value: None,
                max_path_value: None,
            },
            IndexComputation::MinLocalChange => IndexVariantData::MinLocal {
                index: None,
                interval: None,
            },
            IndexComputation::RecurZipf => IndexVariantData::RecurZipf {
                index: None,
                zipf_factored_proba: None,
            },
        };
        IndexData {
            variant,
            max_depth_descendants: if depth_extended { Some(0) } else { None },
        }
    }

    /// The scalar exploration index, whatever the variant.
    pub fn index(&self) -> Option<f64> {
        match &self.variant {
            IndexVariantData::MinGlobal { index, .. } => *index,
            IndexVariantData::MinLocal { index, .. } => *index,
            IndexVariantData::RecurZipf { index, .. } => *index,
        }
    }

    pub fn dot_description(&self) -> String {
        let index = match self.index() {
            Some(index) => format!("{index:.4}"),
            None => "None".to_string(),
        };
        match self.max_depth_descendants {
            Some(max_depth) => format!("index: {index} max_depth_desc: {max_depth}"),
            None => format!("index: {index}"),
        }
    }
}
