use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PostResult<T> = Result<T, PostError>;
pub type ParseResult<T> = PostResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostErrorCategory {
    Success,
    InputValidationError,
    IoSystemError,
    ComputationError,
    InternalError,
}

impl PostErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::InputValidationError => 2,
            Self::IoSystemError => 3,
            Self::ComputationError => 4,
            Self::InternalError => 5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::InputValidationError => "InputValidationError",
            Self::IoSystemError => "IoSystemError",
            Self::ComputationError => "ComputationError",
            Self::InternalError => "InternalError",
        }
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostError {
    category: PostErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl PostError {
    pub fn new(
        category: PostErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(PostErrorCategory::InputValidationError, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(PostErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(PostErrorCategory::ComputationError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(PostErrorCategory::InternalError, placeholder, message)
    }

    pub fn artifact_not_found(message: impl Into<String>) -> Self {
        Self::io_system("IO.ARTIFACT_NOT_FOUND", message)
    }

    pub fn malformed_dump(message: impl Into<String>) -> Self {
        Self::input_validation("INPUT.MALFORMED_DUMP", message)
    }

    pub fn unsupported_topology(name: &str) -> Self {
        Self::input_validation(
            "INPUT.UNSUPPORTED_TOPOLOGY",
            format!("no column-binding entry for model topology '{}'", name),
        )
    }

    pub fn missing_parameter_slot(key: &str, context: &str) -> Self {
        Self::computation(
            "MATCH.PARAMETER_SLOT",
            format!(
                "parameter key '{}' is absent from the header catalog while matching {}",
                key, context
            ),
        )
    }

    pub fn parameter_shape(key: &str, expected: &str) -> Self {
        Self::computation(
            "MATCH.PARAMETER_SHAPE",
            format!("parameter key '{}' does not hold {}", key, expected),
        )
    }

    pub const fn category(&self) -> PostErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for PostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.label(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for PostError {}

#[cfg(test)]
mod tests {
    use super::{PostError, PostErrorCategory};

    #[test]
    fn category_exit_mapping_is_stable() {
        let cases = [
            (PostErrorCategory::Success, 0),
            (PostErrorCategory::InputValidationError, 2),
            (PostErrorCategory::IoSystemError, 3),
            (PostErrorCategory::ComputationError, 4),
            (PostErrorCategory::InternalError, 5),
        ];

        for (category, exit_code) in cases {
            assert_eq!(category.exit_code(), exit_code);
        }
    }

    #[test]
    fn taxonomy_constructors_carry_their_placeholders() {
        let cases = [
            (
                PostError::artifact_not_found("store missing"),
                "IO.ARTIFACT_NOT_FOUND",
                PostErrorCategory::IoSystemError,
            ),
            (
                PostError::malformed_dump("two blocks"),
                "INPUT.MALFORMED_DUMP",
                PostErrorCategory::InputValidationError,
            ),
            (
                PostError::unsupported_topology("5apec"),
                "INPUT.UNSUPPORTED_TOPOLOGY",
                PostErrorCategory::InputValidationError,
            ),
            (
                PostError::missing_parameter_slot("kT3", "component 'apec2'"),
                "MATCH.PARAMETER_SLOT",
                PostErrorCategory::ComputationError,
            ),
        ];

        for (error, placeholder, category) in cases {
            assert_eq!(error.placeholder(), placeholder);
            assert_eq!(error.category(), category);
        }
    }

    #[test]
    fn unsupported_topology_names_the_offender() {
        let error = PostError::unsupported_topology("2bknpower");
        assert!(error.message().contains("'2bknpower'"));
    }

    #[test]
    fn fatal_error_renders_diagnostic_lines() {
        let error = PostError::malformed_dump("data section splits into 2 block(s)");

        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [INPUT.MALFORMED_DUMP] data section splits into 2 block(s)"
        );
        assert_eq!(
            error.fatal_exit_line().as_deref(),
            Some("FATAL EXIT CODE: 2")
        );
    }
}
