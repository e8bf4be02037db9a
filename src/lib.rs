//! A personal finance dashboard backend.
//!
//! Users record income and expenses, set a monthly budget and get a summary of
//! where they stand for the month. Every submitted transaction is validated on
//! the server and rapid repeat submissions are suppressed.
//!
//! This library provides a REST API that responds with JSON. User identity is
//! established by an upstream identity provider, see [identity].

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod action_response;
mod app_state;
pub mod category;
mod dashboard;
mod database_id;
mod db;
pub mod duplicate;
pub mod endpoints;
pub mod identity;
mod logging;
mod routing;
mod settings;
mod timezone;
mod transaction;
mod user;
pub mod validation;

pub use action_response::ActionResponse;
pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use timezone::get_local_offset;
pub use user::{User, UserId};

use crate::validation::ValidationError;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The submitted data broke one of the validation rules.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An identical transaction was accepted moments ago.
    ///
    /// This is not a validation failure: the data is fine, it has just
    /// already been saved. See [duplicate::DuplicateGuard].
    #[error("Transação duplicada: aguarde alguns segundos antes de enviar novamente")]
    DuplicateTransaction,

    /// The request did not carry the identity of a signed in user.
    #[error("Usuário não autenticado")]
    Unauthenticated,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist or belongs to someone else.
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist or belongs to someone else.
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The body of a request or response could not be read.
    #[error("could not read the message body")]
    BodyReadError,

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Error::Validation(error) => (StatusCode::BAD_REQUEST, error.to_string()),
            Error::DuplicateTransaction => (
                StatusCode::CONFLICT,
                Error::DuplicateTransaction.to_string(),
            ),
            Error::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Error::Unauthenticated.to_string(),
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                "O recurso solicitado não foi encontrado".to_owned(),
            ),
            Error::UpdateMissingTransaction => (
                StatusCode::NOT_FOUND,
                "Não foi possível atualizar: transação não encontrada".to_owned(),
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                "Não foi possível excluir: transação não encontrada. \
                Atualize a página para ver se ela já foi excluída."
                    .to_owned(),
            ),
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!(
                    "Fuso horário \"{timezone}\" inválido. \
                    Verifique se o servidor usa um nome de fuso horário canônico."
                ),
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado. Tente novamente mais tarde.".to_owned(),
                )
            }
        };

        (status, ActionResponse::error(message)).into_response()
    }
}
