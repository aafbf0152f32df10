use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CarouselError, Result};

/// Summary card shown in the project strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    #[serde(default)]
    pub short_description: Option<String>,
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub demo_url: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Project {
    /// Short blurb, falling back to the first sentence of the description.
    pub fn blurb(&self) -> String {
        match &self.short_description {
            Some(short) if !short.trim().is_empty() => short.clone(),
            _ => {
                let first = self.description.split('.').next().unwrap_or_default();
                format!("{}.", first.trim())
            }
        }
    }
}

/// What a card renders in its media slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Media<'a> {
    Video(&'a str),
    Image(&'a str),
    /// No media; the card shows its title instead.
    Placeholder(&'a str),
}

/// Content for both carousels on the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub projects: Vec<Project>,
    /// Image references for the about-me strip.
    pub gallery: Vec<String>,
}

impl Catalog {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Both strips need at least one item and every card needs a title.
    pub fn validate(&self) -> Result<()> {
        if self.projects.is_empty() || self.gallery.is_empty() {
            return Err(CarouselError::EmptyItemList);
        }
        if let Some(index) = self.projects.iter().position(|p| p.title.trim().is_empty()) {
            return Err(CarouselError::msg(format!(
                "project #{index} has an empty title"
            )));
        }
        if let Some(index) = self.gallery.iter().position(|g| g.trim().is_empty()) {
            return Err(CarouselError::msg(format!(
                "gallery image #{index} has an empty path"
            )));
        }
        Ok(())
    }

    /// Video wins over image; cards without either show a placeholder.
    pub fn media_for(project: &Project) -> Media<'_> {
        if let Some(video) = project.video.as_deref() {
            Media::Video(video)
        } else if let Some(image) = project.image.as_deref() {
            Media::Image(image)
        } else {
            Media::Placeholder(&project.title)
        }
    }

    pub fn project(&self, title: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.title == title)
    }

    /// Built-in content for the portfolio site.
    pub fn portfolio() -> Self {
        let techs = |names: &[&str]| -> Vec<String> {
            names.iter().map(|n| n.to_string()).collect()
        };
        Self {
            projects: vec![
                Project {
                    title: "Eido".to_string(),
                    short_description: Some(
                        "Full-stack AI learning platform with interactive 3D knowledge graph"
                            .to_string(),
                    ),
                    description: "Built and deployed a full-stack AI learning platform with JWT \
                                  authentication, pgvector embeddings, and OpenAI integration. \
                                  Created an interactive 3D knowledge graph for visualizing \
                                  learning connections."
                        .to_string(),
                    technologies: techs(&[
                        "FastAPI",
                        "Next.js",
                        "Supabase",
                        "OpenAI",
                        "Three.js",
                        "PostgreSQL",
                    ]),
                    demo_url: Some(
                        "https://www.loom.com/share/99480c7998724b5384d7e94962d6e119".to_string(),
                    ),
                    video: Some("/videos/eido.mp4".to_string()),
                    image: None,
                },
                Project {
                    title: "Vocalytics".to_string(),
                    short_description: None,
                    description: "Raspberry Pi-powered tool that tracks speech patterns and \
                                  posture in real time, giving feedback for communication \
                                  practice. Placed 2nd overall at Morgan Hacks."
                        .to_string(),
                    technologies: techs(&[
                        "Python",
                        "Flask",
                        "SQLite",
                        "OpenCV",
                        "Media Pipe",
                        "Gemini AI",
                    ]),
                    demo_url: None,
                    video: None,
                    image: None,
                },
                Project {
                    title: "Machine Learning Project".to_string(),
                    short_description: Some(
                        "Learning AI for obstacle avoidance and 2v2 soccer matches".to_string(),
                    ),
                    description: "Trained agents with ML-Agents to complete obstacle avoidance \
                                  and 2v2 soccer matches against AI opponents, logging brain \
                                  states every 5000ms to measure progress."
                        .to_string(),
                    technologies: techs(&["Python", "C++", "C#", "ML-Agents"]),
                    demo_url: None,
                    video: Some("/videos/ml-agents.mp4".to_string()),
                    image: None,
                },
            ],
            gallery: [
                "/images/esportspic.jpg",
                "/images/image.jpg",
                "/images/kobe.jpg",
                "/images/me.jpg",
                "/images/morganhackpic.jpg",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}
