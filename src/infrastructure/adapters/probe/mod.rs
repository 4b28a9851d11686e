//! Probe Adapter - 资源存在性探测

mod http_asset_probe;

pub use http_asset_probe::HttpAssetProbe;
