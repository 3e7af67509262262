//! Inline and reply keyboard builders.
use crate::model::{CallbackAction, ContentRef, Movie, Series};
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
};
use url::Url;

pub const PER_PAGE: usize = 10;

pub const BTN_ALL_MOVIES: &str = "🎬 All Movies";
pub const BTN_ALL_SERIES: &str = "📺 All Series";
pub const BTN_BROWSE_YEAR: &str = "🗓 Browse by Year";
pub const BTN_BROWSE_CATEGORY: &str = "📚 Browse by Category";
pub const BTN_HELP: &str = "❓ Help & FAQ";
pub const BTN_DONE_UPLOADING: &str = "✅ Done Uploading";

pub fn button(text: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.into(), action.encode())
}

fn back_row() -> Vec<InlineKeyboardButton> {
    vec![button("🔙 Back", CallbackAction::BackToMain)]
}

/// Slice out one page and report whether previous/next pages exist.
fn paginate<T>(items: &[T], page: usize) -> (&[T], bool, bool) {
    let start = (page * PER_PAGE).min(items.len());
    let end = ((page + 1) * PER_PAGE).min(items.len());
    (&items[start..end], page > 0, end < items.len())
}

fn nav_row(
    has_prev: bool,
    has_next: bool,
    page: usize,
    to_action: impl Fn(usize) -> CallbackAction,
) -> Option<Vec<InlineKeyboardButton>> {
    let mut row = Vec::new();
    if has_prev {
        row.push(button("⬅️ Prev", to_action(page - 1)));
    }
    if has_next {
        row.push(button("Next ➡️", to_action(page + 1)));
    }
    (!row.is_empty()).then_some(row)
}

pub fn main_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(BTN_ALL_MOVIES),
            KeyboardButton::new(BTN_ALL_SERIES),
        ],
        vec![
            KeyboardButton::new(BTN_BROWSE_YEAR),
            KeyboardButton::new(BTN_BROWSE_CATEGORY),
        ],
        vec![KeyboardButton::new(BTN_HELP)],
    ])
    .resize_keyboard(true)
}

pub fn done_uploading_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(BTN_DONE_UPLOADING)]])
        .resize_keyboard(true)
        .one_time_keyboard(true)
}

pub fn movie_list(movies: &[Movie], page: usize) -> InlineKeyboardMarkup {
    let (items, has_prev, has_next) = paginate(movies, page);
    let mut rows: Vec<Vec<InlineKeyboardButton>> = items
        .iter()
        .map(|m| {
            vec![button(
                format!("🎬 {} ({})", m.name, m.year),
                CallbackAction::SelectMovie(m.id.clone()),
            )]
        })
        .collect();
    if let Some(nav) = nav_row(has_prev, has_next, page, CallbackAction::MoviePage) {
        rows.push(nav);
    }
    rows.push(back_row());
    InlineKeyboardMarkup::new(rows)
}

pub fn series_list(series: &[Series], page: usize) -> InlineKeyboardMarkup {
    let (items, has_prev, has_next) = paginate(series, page);
    let mut rows: Vec<Vec<InlineKeyboardButton>> = items
        .iter()
        .map(|s| {
            vec![button(
                format!("📺 {} ({})", s.name, s.year),
                CallbackAction::SelectSeries(s.id.clone()),
            )]
        })
        .collect();
    if let Some(nav) = nav_row(has_prev, has_next, page, CallbackAction::SeriesPage) {
        rows.push(nav);
    }
    rows.push(back_row());
    InlineKeyboardMarkup::new(rows)
}

pub fn year_list(years: &[i32], page: usize) -> InlineKeyboardMarkup {
    if years.is_empty() {
        return InlineKeyboardMarkup::new(vec![
            vec![button("No content available yet.", CallbackAction::NoOp)],
            back_row(),
        ]);
    }
    let (items, has_prev, has_next) = paginate(years, page);
    let mut rows: Vec<Vec<InlineKeyboardButton>> = items
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|y| button(y.to_string(), CallbackAction::SelectYear(*y)))
                .collect()
        })
        .collect();
    if let Some(nav) = nav_row(has_prev, has_next, page, CallbackAction::YearPage) {
        rows.push(nav);
    }
    rows.push(back_row());
    InlineKeyboardMarkup::new(rows)
}

pub fn year_content(year: i32) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("🎬 Movies", CallbackAction::YearContent { year, movies: true }),
            button(
                "📺 Series",
                CallbackAction::YearContent {
                    year,
                    movies: false,
                },
            ),
        ],
        vec![button("🔙 Back to Year Selection", CallbackAction::BackToYears)],
    ])
}

pub fn category_list(categories: &[String], page: usize) -> InlineKeyboardMarkup {
    if categories.is_empty() {
        return InlineKeyboardMarkup::new(vec![
            vec![button("No categories available yet.", CallbackAction::NoOp)],
            back_row(),
        ]);
    }
    let (items, has_prev, has_next) = paginate(categories, page);
    let mut rows: Vec<Vec<InlineKeyboardButton>> = items
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|c| button(c.clone(), CallbackAction::SelectCategory(c.clone())))
                .collect()
        })
        .collect();
    if let Some(nav) = nav_row(has_prev, has_next, page, CallbackAction::CategoryPage) {
        rows.push(nav);
    }
    rows.push(back_row());
    InlineKeyboardMarkup::new(rows)
}

pub fn category_content(category: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button(
                "🎬 Movies",
                CallbackAction::CategoryContent {
                    category: category.to_string(),
                    movies: true,
                },
            ),
            button(
                "📺 Series",
                CallbackAction::CategoryContent {
                    category: category.to_string(),
                    movies: false,
                },
            ),
        ],
        vec![button(
            "🔙 Back to Category Selection",
            CallbackAction::BackToCategories,
        )],
    ])
}

pub fn season_list(series: &Series) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = series
        .seasons
        .keys()
        .map(|season| {
            vec![button(
                format!("Season {season}"),
                CallbackAction::SelectSeason {
                    series_id: series.id.clone(),
                    season: *season,
                },
            )]
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

pub fn fetch_again(content: &ContentRef) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        "🔁 GET FILE AGAIN!",
        CallbackAction::Refetch(content.clone()),
    )]])
}

pub fn join_gate(channel: &str) -> InlineKeyboardMarkup {
    let join_url = format!("https://t.me/{}", channel.trim_start_matches('@'));
    let mut rows = Vec::new();
    if let Ok(url) = Url::parse(&join_url) {
        rows.push(vec![InlineKeyboardButton::url("➡️ Join Channel", url)]);
    }
    rows.push(vec![button("✅ I Have Joined", CallbackAction::CheckJoin)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_panel() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("➕ Add Movie", CallbackAction::AdminAddMovie),
            button("➕ Add Series", CallbackAction::AdminAddSeries),
        ],
        vec![
            button("❌ Delete Movie", CallbackAction::AdminDeleteMovie),
            button("❌ Delete Series", CallbackAction::AdminDeleteSeries),
        ],
        vec![
            button("✏️ Rename Movie", CallbackAction::AdminRenameMovie),
            button("✏️ Rename Series", CallbackAction::AdminRenameSeries),
        ],
        vec![button("📝 Edit Series", CallbackAction::AdminEditSeries)],
    ])
}

pub fn cancel() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("🔙 Cancel", CallbackAction::AdminCancel)]])
}

/// Item picker for the admin delete/rename flows. `(id, name)` pairs.
pub fn admin_pick_list(
    items: &[(String, String)],
    movie: bool,
    rename: bool,
) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = items
        .iter()
        .map(|(id, name)| {
            let (icon, action) = if rename {
                ("✏️", CallbackAction::RenameItem { movie, id: id.clone() })
            } else {
                ("❌", CallbackAction::DeleteItem { movie, id: id.clone() })
            };
            vec![button(format!("{icon} {name}"), action)]
        })
        .collect();
    rows.push(vec![button(
        "🔙 Back to Admin Panel",
        CallbackAction::AdminCancel,
    )]);
    InlineKeyboardMarkup::new(rows)
}

pub fn edit_series_list(series: &[Series], page: usize) -> InlineKeyboardMarkup {
    let (items, has_prev, has_next) = paginate(series, page);
    let mut rows: Vec<Vec<InlineKeyboardButton>> = items
        .iter()
        .map(|s| {
            vec![button(
                format!("📝 {} ({})", s.name, s.year),
                CallbackAction::EditSeriesSelect(s.id.clone()),
            )]
        })
        .collect();
    if let Some(nav) = nav_row(has_prev, has_next, page, CallbackAction::EditSeriesPage) {
        rows.push(nav);
    }
    rows.push(vec![button(
        "🔙 Back to Admin Panel",
        CallbackAction::AdminCancel,
    )]);
    InlineKeyboardMarkup::new(rows)
}

pub fn edit_season_list(series: &Series) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = series
        .seasons
        .iter()
        .map(|(season, episodes)| {
            vec![button(
                format!("Season {season} ({} episodes)", episodes.len()),
                CallbackAction::EditSeasonSelect {
                    series_id: series.id.clone(),
                    season: *season,
                },
            )]
        })
        .collect();
    rows.push(vec![button(
        "🔙 Back to Series List",
        CallbackAction::AdminEditSeries,
    )]);
    InlineKeyboardMarkup::new(rows)
}

pub fn edit_actions() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("➕ Add Episodes", CallbackAction::EditActionAdd)],
        vec![button("❌ Remove Episodes", CallbackAction::EditActionRemove)],
        vec![button("🔙 Back", CallbackAction::AdminEditSeries)],
    ])
}

pub fn remove_episode_list(series_id: &str, season: u32, count: usize) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = (0..count)
        .map(|index| {
            vec![button(
                format!("❌ Episode {}", index + 1),
                CallbackAction::RemoveEpisode {
                    series_id: series_id.to_string(),
                    season,
                    index,
                },
            )]
        })
        .collect();
    rows.push(vec![button("✅ Done", CallbackAction::AdminEditSeries)]);
    InlineKeyboardMarkup::new(rows)
}
