#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod instructor_service;
pub mod question_source;
pub mod quiz;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, InstructorError, QuestionSourceError, QuizError, QuizServiceError};
pub use instructor_service::{InstructorService, LearnerReport};
pub use question_source::{QuestionSource, RemoteQuestionSource, RepositorySource};
pub use quiz::{
    Advance, Phase, QuestionSelector, QuizLoopService, QuizProgress, QuizSession, QuizStep,
    THEME_ALL, TickEvent,
};
