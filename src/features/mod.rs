//! Serial correlation features used for order identification.

pub mod autocorrelation;

pub use autocorrelation::{
    acf, acf_profile, pacf, pacf_profile, significance_band, CorrelationProfile,
};
