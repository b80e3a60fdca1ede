use crate::utils::error::Result;

/// Destination for generated pattern files.
pub trait Storage: Send + Sync {
    fn upload(
        &self,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Location clients can fetch `path` from once uploaded.
    fn public_url(&self, path: &str) -> String;
}
