use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use snafu::prelude::*;

use crate::handlers::ErrorResponse;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[snafu(context(suffix(false)))]
pub enum Error {
    Datatypes {
        source: geoalgebra_datatypes::Error,
    },
    Operators {
        source: geoalgebra_operators::Error,
    },
    SerdeJson {
        source: serde_json::Error,
    },
    Io {
        source: std::io::Error,
    },
    Config {
        source: config::ConfigError,
    },
    Uuid {
        source: uuid::Error,
    },
    #[cfg(feature = "redis-store")]
    Redis {
        source: redis::RedisError,
    },

    #[snafu(display("map {} does not exist", id))]
    UnknownMap {
        id: String,
    },

    #[snafu(display("invalid visualization parameters: {}", reason))]
    InvalidVisualization {
        reason: String,
    },

    #[snafu(display("malformed request body: {}", reason))]
    MalformedRequest {
        reason: String,
    },

    ServerStartup,
}

impl actix_web::error::ResponseError for Error {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // 500-class failures are internal by definition (PROJ errors, I/O,
        // config, GDAL) — the client gets an opaque body and the real
        // cause goes to the log, not the wire.
        let detail = if status.is_server_error() {
            tracing::error!(error = %self, "internal error handling request");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(ErrorResponse {
            code: status.as_u16(),
            detail,
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Error::UnknownMap { id: _ } => StatusCode::NOT_FOUND,
            Error::Operators { source } => operator_status_code(source),
            Error::Datatypes { source } => datatypes_status_code(source),
            Error::SerdeJson { .. } => StatusCode::BAD_REQUEST,
            Error::InvalidVisualization { .. } => StatusCode::BAD_REQUEST,
            Error::MalformedRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Uuid { .. } => StatusCode::BAD_REQUEST,
            Error::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::ServerStartup => StatusCode::INTERNAL_SERVER_ERROR,
            #[cfg(feature = "redis-store")]
            Error::Redis { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn operator_status_code(source: &geoalgebra_operators::Error) -> StatusCode {
    use geoalgebra_operators::Error as OpError;
    match source {
        OpError::UnknownOperation { .. }
        | OpError::MalformedGraph { .. }
        | OpError::InvalidBandName { .. }
        | OpError::InvalidVisualization { .. }
        | OpError::Boundless
        | OpError::TileOutsideBounds => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// PROJ/transform failures are the server's own reprojection machinery
/// misbehaving (no client input maps to them directly); bad bounds or an
/// unrecognized CRS authority/code are the client's fault.
fn datatypes_status_code(source: &geoalgebra_datatypes::Error) -> StatusCode {
    use geoalgebra_datatypes::Error as DtError;
    match source {
        DtError::Proj { .. } | DtError::Transform { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

impl From<geoalgebra_datatypes::Error> for Error {
    fn from(source: geoalgebra_datatypes::Error) -> Self {
        Error::Datatypes { source }
    }
}

impl From<geoalgebra_operators::Error> for Error {
    fn from(source: geoalgebra_operators::Error) -> Self {
        Error::Operators { source }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::SerdeJson { source }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { source }
    }
}

impl From<config::ConfigError> for Error {
    fn from(source: config::ConfigError) -> Self {
        Error::Config { source }
    }
}

impl From<uuid::Error> for Error {
    fn from(source: uuid::Error) -> Self {
        Error::Uuid { source }
    }
}

#[cfg(feature = "redis-store")]
impl From<redis::RedisError> for Error {
    fn from(source: redis::RedisError) -> Self {
        Error::Redis { source }
    }
}
