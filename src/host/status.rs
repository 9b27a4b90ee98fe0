//! Foutafhandeling en statusaccumulatie voor host-SDK aanroepen.

use core::fmt;

use crate::geom::nurbs::CurveError;

/// Fouten die de host-ABI kan rapporteren.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    #[error("attribute `{name}` does not exist on this node")]
    UnknownAttribute { name: String },
    #[error("attribute `{name}` is not a {expected} (found {found})")]
    AttributeTypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("attribute `{name}` already exists on this node")]
    DuplicateAttribute { name: String },
    #[error("attribute `{name}` is not a compound")]
    NotACompound { name: String },
    #[error("array element {index} is out of range ({count} physical elements)")]
    MissingElement { index: usize, count: usize },
    #[error("array handle is not positioned on an element")]
    NoCurrentElement,
    #[error("plug does not belong to this node")]
    UnknownPlug,
    #[error(transparent)]
    Curve(#[from] CurveError),
}

/// Resultaattype voor host-ABI aanroepen.
pub type HostResult<T> = Result<T, HostError>;

/// Eerste geregistreerde fout, samen met de tag van de aanroepplek.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedError {
    pub tag: String,
    pub error: HostError,
}

impl fmt::Display for RecordedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.tag, self.error)
    }
}

/// Accumulator die per compute de statussen van host-SDK aanroepen opvouwt.
///
/// Elke aanroepplek registreert zijn resultaat met een tag; alleen de eerste
/// fout blijft bewaard en wordt gerapporteerd. Herstelbare degradaties horen
/// hier niet thuis.
#[derive(Debug, Default)]
pub struct StatusAccumulator {
    first: Option<RecordedError>,
}

impl StatusAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Vouw het resultaat van een aanroep in. Geeft de waarde terug bij
    /// succes; bij een fout blijft alleen de eerste bewaard.
    pub fn record<T>(&mut self, tag: &str, result: HostResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                if self.first.is_none() {
                    self.first = Some(RecordedError {
                        tag: tag.to_owned(),
                        error,
                    });
                }
                None
            }
        }
    }

    /// Is er al een fout geregistreerd?
    #[must_use]
    pub fn error(&self) -> bool {
        self.first.is_some()
    }

    /// De eerste geregistreerde fout, indien aanwezig.
    #[must_use]
    pub fn first_error(&self) -> Option<&RecordedError> {
        self.first.as_ref()
    }

    /// Controlepunt: logt de eerste fout via de logging-facade en levert
    /// haar op; daarna is de accumulator weer leeg.
    pub fn checkpoint(&mut self) -> HostResult<()> {
        match self.first.take() {
            Some(recorded) => {
                log::error!("{recorded}");
                Err(recorded.error)
            }
            None => Ok(()),
        }
    }

    /// Zet de accumulator om in een gewoon resultaat met de eerste fout.
    pub fn into_result(self) -> HostResult<()> {
        match self.first {
            Some(recorded) => Err(recorded.error),
            None => Ok(()),
        }
    }
}
