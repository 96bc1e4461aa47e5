// Document retrieval: the portal's two-phase form protocol and its retry policy.

pub mod html;
pub mod portal;
pub mod retry;
pub mod traits;
