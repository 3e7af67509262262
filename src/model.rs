use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use teloxide::types::{ChatId, MessageId};

/// A movie entry: one cover photo and an ordered list of video file ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub name: String,
    pub year: i32,
    pub categories: Vec<String>,
    pub cover_file_id: String,
    pub timer_minutes: u32,
    pub videos: Vec<String>,
}

/// A series entry. Each season owns its ordered episode list; the
/// auto-delete timer is shared across seasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub id: String,
    pub name: String,
    pub year: i32,
    pub categories: Vec<String>,
    pub cover_file_id: String,
    pub timer_minutes: u32,
    pub seasons: BTreeMap<u32, Vec<String>>,
}

impl Series {
    pub fn season_label(&self, season: u32) -> String {
        format!("{} S{}", self.name, season)
    }
}

/// What a delivery (and the refetch button it leaves behind) points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRef {
    Movie { id: String },
    SeriesSeason { series_id: String, season: u32 },
}

impl ContentRef {
    pub fn content_id(&self) -> &str {
        match self {
            ContentRef::Movie { id } => id,
            ContentRef::SeriesSeason { series_id, .. } => series_id,
        }
    }
}

/// Message ids produced by one delivery. `media` may be shorter than the
/// requested list when individual sends failed.
#[derive(Debug, Clone, Default)]
pub struct DeliveryResult {
    pub photo: Option<MessageId>,
    pub media: Vec<MessageId>,
}

impl DeliveryResult {
    pub fn all_message_ids(&self) -> Vec<MessageId> {
        let mut ids = Vec::with_capacity(self.media.len() + 1);
        if let Some(photo) = self.photo {
            ids.push(photo);
        }
        ids.extend(self.media.iter().copied());
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.photo.is_none() && self.media.is_empty()
    }
}

/// One scheduled bulk deletion: everything a fired job needs to clean up the
/// chat and render the "get again" prompt.
#[derive(Debug, Clone)]
pub struct DeletionJob {
    pub chat: ChatId,
    pub messages: Vec<MessageId>,
    pub delay: Duration,
    pub content: ContentRef,
    pub label: String,
}

impl DeletionJob {
    /// Base job name. The scheduler appends a sequence number so that a
    /// re-delivered item gets its own independent job.
    pub fn key(&self) -> String {
        format!("delete_prompt_{}_{}", self.chat.0, self.content.content_id())
    }
}

/// Every callback-data token the bot emits, parsed up front instead of
/// prefix-matched at each handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    SelectMovie(String),
    SelectSeries(String),
    SelectSeason { series_id: String, season: u32 },
    MoviePage(usize),
    SeriesPage(usize),
    YearPage(usize),
    SelectYear(i32),
    YearContent { year: i32, movies: bool },
    CategoryPage(usize),
    SelectCategory(String),
    CategoryContent { category: String, movies: bool },
    Refetch(ContentRef),
    BackToMain,
    BackToYears,
    BackToCategories,
    CheckJoin,
    NoOp,
    AdminAddMovie,
    AdminAddSeries,
    AdminDeleteMovie,
    AdminDeleteSeries,
    AdminRenameMovie,
    AdminRenameSeries,
    AdminEditSeries,
    AdminCancel,
    DeleteItem { movie: bool, id: String },
    RenameItem { movie: bool, id: String },
    EditSeriesPage(usize),
    EditSeriesSelect(String),
    EditSeasonSelect { series_id: String, season: u32 },
    EditActionAdd,
    EditActionRemove,
    RemoveEpisode { series_id: String, season: u32, index: usize },
}

impl CallbackAction {
    pub fn encode(&self) -> String {
        use CallbackAction::*;
        match self {
            SelectMovie(id) => format!("movie_select_{id}"),
            SelectSeries(id) => format!("series_select_{id}"),
            SelectSeason { series_id, season } => {
                format!("season_select_{series_id}_{season}")
            }
            MoviePage(p) => format!("movie_page_{p}"),
            SeriesPage(p) => format!("series_page_{p}"),
            YearPage(p) => format!("year_page_{p}"),
            SelectYear(y) => format!("year_select_{y}"),
            YearContent { year, movies } => {
                format!("year_content_{year}_{}", kind_str(*movies))
            }
            CategoryPage(p) => format!("cat_page_{p}"),
            SelectCategory(c) => format!("cat_select_{c}"),
            CategoryContent { category, movies } => {
                format!("cat_content_{category}_{}", kind_str(*movies))
            }
            Refetch(ContentRef::Movie { id }) => format!("reget_movie_{id}"),
            Refetch(ContentRef::SeriesSeason { series_id, season }) => {
                format!("reget_series_{series_id}_{season}")
            }
            BackToMain => "back_to_main_menu".into(),
            BackToYears => "browse_year_from_callback".into(),
            BackToCategories => "browse_category_from_callback".into(),
            CheckJoin => "check_join_status".into(),
            NoOp => "no_op".into(),
            AdminAddMovie => "admin_add_movie".into(),
            AdminAddSeries => "admin_add_series".into(),
            AdminDeleteMovie => "admin_delete_movie".into(),
            AdminDeleteSeries => "admin_delete_series".into(),
            AdminRenameMovie => "admin_rename_movie".into(),
            AdminRenameSeries => "admin_rename_series".into(),
            AdminEditSeries => "admin_edit_series".into(),
            AdminCancel => "admin_cancel".into(),
            DeleteItem { movie: true, id } => format!("del_movie_{id}"),
            DeleteItem { movie: false, id } => format!("del_series_{id}"),
            RenameItem { movie: true, id } => format!("ren_movie_{id}"),
            RenameItem { movie: false, id } => format!("ren_series_{id}"),
            EditSeriesPage(p) => format!("edit_series_page_{p}"),
            EditSeriesSelect(id) => format!("edit_series_select_{id}"),
            EditSeasonSelect { series_id, season } => {
                format!("edit_season_select_{series_id}_{season}")
            }
            EditActionAdd => "edit_action_add".into(),
            EditActionRemove => "edit_action_remove".into(),
            RemoveEpisode {
                series_id,
                season,
                index,
            } => format!("remove_episode_{series_id}_{season}_{index}"),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        use CallbackAction::*;
        let action = match data {
            "back_to_main_menu" => BackToMain,
            "browse_year_from_callback" => BackToYears,
            "browse_category_from_callback" => BackToCategories,
            "check_join_status" => CheckJoin,
            "no_op" => NoOp,
            "admin_add_movie" => AdminAddMovie,
            "admin_add_series" => AdminAddSeries,
            "admin_delete_movie" => AdminDeleteMovie,
            "admin_delete_series" => AdminDeleteSeries,
            "admin_rename_movie" => AdminRenameMovie,
            "admin_rename_series" => AdminRenameSeries,
            "admin_edit_series" => AdminEditSeries,
            "admin_cancel" => AdminCancel,
            "edit_action_add" => EditActionAdd,
            "edit_action_remove" => EditActionRemove,
            _ => return Self::parse_prefixed(data),
        };
        Some(action)
    }

    fn parse_prefixed(data: &str) -> Option<Self> {
        use CallbackAction::*;
        if let Some(rest) = data.strip_prefix("movie_select_") {
            return Some(SelectMovie(rest.to_string()));
        }
        if let Some(rest) = data.strip_prefix("series_select_") {
            return Some(SelectSeries(rest.to_string()));
        }
        if let Some(rest) = data.strip_prefix("season_select_") {
            let (series_id, season) = rest.rsplit_once('_')?;
            return Some(SelectSeason {
                series_id: series_id.to_string(),
                season: season.parse().ok()?,
            });
        }
        if let Some(rest) = data.strip_prefix("movie_page_") {
            return Some(MoviePage(rest.parse().ok()?));
        }
        if let Some(rest) = data.strip_prefix("series_page_") {
            return Some(SeriesPage(rest.parse().ok()?));
        }
        if let Some(rest) = data.strip_prefix("year_page_") {
            return Some(YearPage(rest.parse().ok()?));
        }
        if let Some(rest) = data.strip_prefix("year_select_") {
            return Some(SelectYear(rest.parse().ok()?));
        }
        if let Some(rest) = data.strip_prefix("year_content_") {
            let (year, kind) = rest.rsplit_once('_')?;
            return Some(YearContent {
                year: year.parse().ok()?,
                movies: parse_kind(kind)?,
            });
        }
        if let Some(rest) = data.strip_prefix("cat_page_") {
            return Some(CategoryPage(rest.parse().ok()?));
        }
        if let Some(rest) = data.strip_prefix("cat_select_") {
            return Some(SelectCategory(rest.to_string()));
        }
        if let Some(rest) = data.strip_prefix("cat_content_") {
            let (category, kind) = rest.rsplit_once('_')?;
            return Some(CategoryContent {
                category: category.to_string(),
                movies: parse_kind(kind)?,
            });
        }
        if let Some(rest) = data.strip_prefix("reget_movie_") {
            return Some(Refetch(ContentRef::Movie {
                id: rest.to_string(),
            }));
        }
        if let Some(rest) = data.strip_prefix("reget_series_") {
            let (series_id, season) = rest.rsplit_once('_')?;
            return Some(Refetch(ContentRef::SeriesSeason {
                series_id: series_id.to_string(),
                season: season.parse().ok()?,
            }));
        }
        if let Some(rest) = data.strip_prefix("del_movie_") {
            return Some(DeleteItem {
                movie: true,
                id: rest.to_string(),
            });
        }
        if let Some(rest) = data.strip_prefix("del_series_") {
            return Some(DeleteItem {
                movie: false,
                id: rest.to_string(),
            });
        }
        if let Some(rest) = data.strip_prefix("ren_movie_") {
            return Some(RenameItem {
                movie: true,
                id: rest.to_string(),
            });
        }
        if let Some(rest) = data.strip_prefix("ren_series_") {
            return Some(RenameItem {
                movie: false,
                id: rest.to_string(),
            });
        }
        if let Some(rest) = data.strip_prefix("edit_series_page_") {
            return Some(EditSeriesPage(rest.parse().ok()?));
        }
        if let Some(rest) = data.strip_prefix("edit_series_select_") {
            return Some(EditSeriesSelect(rest.to_string()));
        }
        if let Some(rest) = data.strip_prefix("edit_season_select_") {
            let (series_id, season) = rest.rsplit_once('_')?;
            return Some(EditSeasonSelect {
                series_id: series_id.to_string(),
                season: season.parse().ok()?,
            });
        }
        if let Some(rest) = data.strip_prefix("remove_episode_") {
            let (head, index) = rest.rsplit_once('_')?;
            let (series_id, season) = head.rsplit_once('_')?;
            return Some(RemoveEpisode {
                series_id: series_id.to_string(),
                season: season.parse().ok()?,
                index: index.parse().ok()?,
            });
        }
        None
    }
}

fn kind_str(movies: bool) -> &'static str {
    if movies {
        "movies"
    } else {
        "series"
    }
}

fn parse_kind(s: &str) -> Option<bool> {
    match s {
        "movies" => Some(true),
        "series" => Some(false),
        _ => None,
    }
}
