pub mod bottleneck;
pub mod buckets;
pub mod flow;
pub mod forecast;
pub mod generator;
pub mod kpi;
pub mod metrics;

#[cfg(test)]
pub(crate) mod test_support;
