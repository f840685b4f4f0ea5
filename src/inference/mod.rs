//! Inference — turning juxtaposition evidence into MRCA estimates

mod estimators;
mod prior;

pub use estimators::{
    estimate_patristic_distance_between, estimate_rank_of_mrca_between,
    estimate_rank_of_mrca_maximum_likelihood, estimate_rank_of_mrca_unbiased,
    estimate_ranks_since_mrca_with, Estimator, UnknownEstimator,
};
pub use prior::{
    ArbitraryPrior, BuiltinPrior, ExponentialPrior, GeometricPrior, Prior, UniformPrior,
    UnknownPrior,
};
