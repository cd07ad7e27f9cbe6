//! Mail transport and background dispatch.

pub mod dispatcher;
pub mod log;
pub mod smtp;

pub use dispatcher::MailDispatcher;
pub use log::LogMailer;
pub use smtp::SmtpMailer;
