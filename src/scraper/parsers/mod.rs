//! HTML and embedded-JSON parsers for course effect pages.

pub mod course_page;
pub mod headline;
pub mod skill_payload;

pub use course_page::{CardImage, CoursePage, CoursePageParser, SkillCard, MISSING_HEADLINE};
pub use headline::HeadlineInfo;
pub use skill_payload::{merge_cards, rarity_rank, MergeReport, SkillPayloadParser};
