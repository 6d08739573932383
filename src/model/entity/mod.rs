mod user;
pub use user::{User, UserCreate, UserUpdate};

mod course;
pub use course::{
    Course, CourseCatalogRow, CourseCreate, CourseInstructorRow, CourseManageRow, CourseUpdate,
};

mod module;
pub use module::{Module, ModuleCreate, ModuleUpdate};

mod lesson;
pub use lesson::{Lesson, LessonCreate, LessonUpdate};

mod enrollment;
pub use enrollment::{CourseStudentRow, Enrollment, EnrollmentStatus, MyCourseRow};

mod learning_progress;
pub use learning_progress::{LearningProgress, LearningProgressUpsert, completion_percentage};

mod quiz;
pub use quiz::{Quiz, QuizCreate};

mod quiz_question;
pub use quiz_question::{QuizQuestion, QuizQuestionCreate, QuizQuestionPublic};

mod quiz_attempt;
pub use quiz_attempt::{QuizAttempt, QuizAttemptCreate};

mod discussion;
pub use discussion::{Discussion, DiscussionCreate, DiscussionRow, DiscussionUpdate};

mod discussion_reply;
pub use discussion_reply::{DiscussionReply, DiscussionReplyCreate, DiscussionReplyRow};

mod review;
pub use review::{
    MAX_RATING, MIN_RATING, RecentReviewRow, Review, ReviewCreate, ReviewRow, ReviewUpdate,
    is_valid_rating,
};

mod transaction;
pub use transaction::{
    Transaction, TransactionCreate, TransactionHistoryRow, TransactionSettlement,
    TransactionStatus, new_session_id,
};

mod xapi_statement;
pub use xapi_statement::{XapiStatement, XapiStatementCreate};
