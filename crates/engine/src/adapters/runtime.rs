// adapters/runtime.rs

/// Drive an async fetch to completion from synchronous code.
pub fn run_on_current_thread<F, T, E>(fut: F) -> Result<T, E>
where
  F: std::future::Future<Output = Result<T, E>>,
  E: From<std::io::Error>,
{
  // If we're already inside a Tokio runtime, avoid creating a nested runtime.
  // Use block_in_place to safely block on the current multi-thread runtime.
  if let Ok(handle) = tokio::runtime::Handle::try_current() {
    return tokio::task::block_in_place(|| handle.block_on(fut));
  }

  // Otherwise, create a lightweight current-thread runtime just for this call.
  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()?;
  rt.block_on(fut)
}
