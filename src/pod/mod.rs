//! Transport boundary: the static pod description, request framing, argument adaptation and
//! the socket server.

pub mod describe;
pub mod dispatch;
pub mod message;
#[cfg(unix)]
pub mod server;

pub use describe::{DEFAULT_NAMESPACE, DescribeResponse, Namespace, VARS, Var};
pub use dispatch::MongoPod;
pub use message::{ErrorData, Op, Request, Response, Status};
#[cfg(unix)]
pub use server::{ServerOptions, bind, serve};
