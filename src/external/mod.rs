//! External collaborators: the shared HTTP client and outbound senders.

pub mod client;
pub mod feishu;
pub mod mas;

pub use feishu::FeishuClient;
pub use mas::MasClient;
