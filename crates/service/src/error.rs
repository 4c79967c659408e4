use thiserror::Error;

use petclinic_core::DomainError;
use petclinic_infra::RepositoryError;

/// Error returned by every `ClinicService` operation.
///
/// Domain failures raised inside a store (missing references, unknown ids on
/// update) surface as `Domain`, the same as those raised by the service itself.
#[derive(Debug, Error)]
pub enum ClinicError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl ClinicError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_not_found())
    }
}

impl From<RepositoryError> for ClinicError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Domain(e) => Self::Domain(e),
            other => Self::Repository(other),
        }
    }
}

pub type ClinicResult<T> = Result<T, ClinicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_domain_errors_are_lifted() {
        let err: ClinicError = RepositoryError::Domain(DomainError::not_found("pet", 9)).into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "pet with id 9 not found");

        let err: ClinicError = RepositoryError::Poisoned.into();
        assert!(matches!(err, ClinicError::Repository(RepositoryError::Poisoned)));
        assert!(!err.is_not_found());
    }
}
