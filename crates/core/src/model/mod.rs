mod attempt;
mod ids;
mod lesson;
mod user;

pub use ids::{AttemptId, LessonId, OptionId, ParseIdError, QuizId, UserId};

pub use attempt::Attempt;
pub use lesson::{LeadershipNote, Lesson, LessonType, QuestionType, Quiz, QuizOption};
pub use user::{Role, RoleParseError, User};
