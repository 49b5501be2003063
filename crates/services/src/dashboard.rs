//! Landing-page figures, per role.

use std::sync::Arc;

use lms_core::model::{LessonId, User};
use lms_core::progress::{QuizProgress, rounded_percent};
use serde::Serialize;
use tracing::debug;

use crate::attempt_service::AttemptService;
use crate::error::DashboardError;
use crate::lesson_service::LessonService;
use crate::stats::LessonStats;

/// How many lessons the student dashboard lists.
pub const RECENT_LESSONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonCard {
    pub lesson_id: LessonId,
    pub title: String,
    pub reference: Option<String>,
    pub percent_complete: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonSummary {
    pub lesson_id: LessonId,
    pub title: String,
    pub questions: usize,
    pub stats: LessonStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Dashboard {
    Student {
        first_name: String,
        recent: Vec<LessonCard>,
        lessons_completed: usize,
        /// Correct over attempted across every lesson, latest answers only.
        average_score: u8,
    },
    Staff {
        first_name: String,
        lesson_count: usize,
        lessons: Vec<LessonSummary>,
        can_manage: bool,
    },
}

#[derive(Clone)]
pub struct DashboardService {
    lessons: Arc<LessonService>,
    attempts: Arc<AttemptService>,
}

impl DashboardService {
    #[must_use]
    pub fn new(lessons: Arc<LessonService>, attempts: Arc<AttemptService>) -> Self {
        Self { lessons, attempts }
    }

    /// Build the dashboard `user` should see.
    ///
    /// Students get their own progress. Every other role gets the curriculum
    /// overview, with `can_manage` false for roles that only observe.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError` if lessons or attempts cannot be read.
    pub async fn for_user(&self, user: &User) -> Result<Dashboard, DashboardError> {
        let lessons = self.lessons.list_lessons().await?;
        debug!(user = %user.id, lessons = lessons.len(), "building dashboard");

        if user.role.can_take_quizzes() {
            let mut recent = Vec::with_capacity(RECENT_LESSONS);
            let mut lessons_completed = 0;
            let mut overall = QuizProgress::default();
            for (i, lesson) in lessons.iter().enumerate() {
                let progress = self.attempts.progress_in(&user.id, lesson).await?;
                if progress.is_complete() {
                    lessons_completed += 1;
                }
                overall = overall.combine(progress.combined());
                if i < RECENT_LESSONS {
                    recent.push(LessonCard {
                        lesson_id: lesson.id.clone(),
                        title: lesson.title.clone(),
                        reference: lesson.reference_label(),
                        percent_complete: progress.percent_complete(),
                    });
                }
            }
            return Ok(Dashboard::Student {
                first_name: user.first_name().to_owned(),
                recent,
                lessons_completed,
                average_score: rounded_percent(overall.correct, overall.attempted),
            });
        }

        let mut summaries = Vec::with_capacity(lessons.len());
        for lesson in &lessons {
            summaries.push(LessonSummary {
                lesson_id: lesson.id.clone(),
                title: lesson.title.clone(),
                questions: lesson.question_count(),
                stats: self.attempts.lesson_stats(lesson).await?,
            });
        }
        Ok(Dashboard::Staff {
            first_name: user.first_name().to_owned(),
            lesson_count: lessons.len(),
            lessons: summaries,
            can_manage: user.role.can_manage_curriculum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::Clock;
    use lms_core::model::{OptionId, QuizId, Role};
    use lms_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;
    use storage::seed::genesis_lesson;

    async fn services() -> (DashboardService, Arc<LessonService>, Arc<AttemptService>) {
        let repo = Arc::new(InMemoryRepository::new());
        let clock: Clock = fixed_clock();
        let lessons = Arc::new(LessonService::new(clock, repo.clone()));
        let attempts = Arc::new(AttemptService::new(clock, repo.clone(), repo));
        let genesis = genesis_lesson(fixed_now());
        lessons.save_lesson(&genesis).await.unwrap();
        for n in 2..=4 {
            let copy = genesis.relabelled(
                LessonId::new(format!("GENESIS-CH{n}")),
                format!("Imported Lesson {n}"),
            );
            lessons.save_lesson(&copy).await.unwrap();
        }
        let dashboard = DashboardService::new(Arc::clone(&lessons), Arc::clone(&attempts));
        (dashboard, lessons, attempts)
    }

    #[tokio::test]
    async fn student_sees_first_three_lessons_with_progress() {
        let (dashboard, _, attempts) = services().await;
        let student = User::new("student1", "John Student", "john@lms.com", Role::Student);
        let genesis = LessonId::new("GENESIS-CH1");
        for (quiz, option) in [("GEN1-Q1", "A"), ("GEN1-Q2", "A"), ("NOTE-Q1", "A")] {
            attempts
                .answer(&student, &genesis, &QuizId::new(quiz), &OptionId::new(option))
                .await
                .unwrap();
        }

        let Dashboard::Student {
            first_name,
            recent,
            lessons_completed,
            average_score,
        } = dashboard.for_user(&student).await.unwrap()
        else {
            panic!("expected student dashboard");
        };
        assert_eq!(first_name, "John");
        assert_eq!(recent.len(), RECENT_LESSONS);
        assert_eq!(recent[0].percent_complete, 100);
        assert_eq!(recent[0].reference.as_deref(), Some("Genesis 1"));
        assert_eq!(recent[1].percent_complete, 0);
        assert_eq!(lessons_completed, 1);
        assert_eq!(average_score, 67);
    }

    #[tokio::test]
    async fn staff_and_parents_see_the_overview() {
        let (dashboard, _, _) = services().await;
        let mentor = User::new("mentor1", "Mike Mentor", "mike@lms.com", Role::Mentor);
        let parent = User::new("parent1", "Pat Parent", "pat@lms.com", Role::Parent);

        let Dashboard::Staff {
            lesson_count,
            lessons,
            can_manage,
            ..
        } = dashboard.for_user(&mentor).await.unwrap()
        else {
            panic!("expected staff dashboard");
        };
        assert_eq!(lesson_count, 4);
        assert_eq!(lessons.len(), 4);
        assert_eq!(lessons[0].questions, 3);
        assert_eq!(lessons[0].stats, LessonStats::default());
        assert!(can_manage);

        let Dashboard::Staff { can_manage, .. } = dashboard.for_user(&parent).await.unwrap() else {
            panic!("expected staff dashboard");
        };
        assert!(!can_manage);
    }
}
