use super::{Audience, FeedItem, ViewerContext};

/// Whether `viewer` may see `item`.
///
/// Authors always see their own posts. Everyone else needs the item to be
/// no older than their join date, scoped to no module or to one of theirs,
/// and addressed to an audience they belong to. The SQLite item store
/// translates this same expression into its WHERE clause.
pub fn is_visible(item: &FeedItem, viewer: &ViewerContext) -> bool {
    if item.created_by == viewer.user_name {
        return true;
    }

    let after_join = viewer
        .visible_from()
        .map_or(true, |from| item.created_at >= from);

    let in_scope = item
        .module_id
        .map_or(true, |module_id| viewer.is_registered_in(module_id));

    after_join && in_scope && audience_matches(item.audience, item.module_id, viewer)
}

pub fn audience_matches(audience: Audience, module_id: Option<i64>, viewer: &ViewerContext) -> bool {
    match audience {
        Audience::All => true,
        Audience::Students => viewer.is_student(),
        Audience::Staff => viewer.is_staff(),
        Audience::ModuleStudents => {
            viewer.is_student() && module_id.is_some_and(|id| viewer.is_registered_in(id))
        }
    }
}
