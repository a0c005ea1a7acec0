//! Template operations for the PostgreSQL backend.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use super::SqlResult;
use crate::backend::BackendError;
use crate::query::{ListQuery, Listing, SortSpec};
use crate::template::{MealTemplate, MealTemplatePatch, TemplateFilter, TemplateStats};

const COLUMNS: &str = "id, title, description, meal_type, calories, protein_g, \
     carbs_g, fat_g, tags, created_by, created_at, updated_at";

fn from_row(row: &PgRow) -> SqlResult<MealTemplate> {
    Ok(MealTemplate {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        meal_type: row.try_get("meal_type")?,
        calories: row.try_get::<i32, _>("calories")? as u32,
        protein_g: row.try_get::<i32, _>("protein_g")? as u32,
        carbs_g: row.try_get::<i32, _>("carbs_g")? as u32,
        fat_g: row.try_get::<i32, _>("fat_g")? as u32,
        tags: row.try_get("tags")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &TemplateFilter) {
    builder.push(" WHERE TRUE");
    if let Some(meal_type) = &filter.meal_type {
        builder.push(" AND meal_type = ").push_bind(meal_type.clone());
    }
    if let Some(tag) = &filter.tag {
        builder.push(" AND ").push_bind(tag.clone()).push(" = ANY(tags)");
    }
    if let Some(search) = &filter.search {
        builder
            .push(" AND title ILIKE ")
            .push_bind(format!("%{}%", search));
    }
}

fn order_clause(sort: Option<&SortSpec>) -> String {
    let (column, ascending) = match sort {
        Some(sort) => (sort.column.as_str(), sort.ascending),
        None => ("created_at", true),
    };
    let column = match column {
        "title" => "title",
        "calories" => "calories",
        "meal_type" => "meal_type",
        _ => "created_at",
    };
    let direction = if ascending { "ASC" } else { "DESC" };
    format!(" ORDER BY {} {}, id ASC", column, direction)
}

/// Lists templates matching the query, with the total matching count.
pub async fn list(
    pool: &PgPool,
    query: &ListQuery<TemplateFilter>,
) -> SqlResult<Listing<MealTemplate>> {
    let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM meal_templates");
    push_filters(&mut count_builder, &query.filter);
    let total: i64 = count_builder
        .build_query_scalar()
        .fetch_one(pool)
        .await
        .map_err(BackendError::from)?;

    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {} FROM meal_templates", COLUMNS));
    push_filters(&mut builder, &query.filter);
    builder.push(order_clause(query.sort.as_ref()));
    if let Some(window) = &query.pagination {
        builder.push(" LIMIT ").push_bind(window.limit() as i64);
        builder.push(" OFFSET ").push_bind(window.offset() as i64);
    }

    let rows = builder
        .build()
        .fetch_all(pool)
        .await
        .map_err(BackendError::from)?;
    let templates = rows.iter().map(from_row).collect::<SqlResult<Vec<_>>>()?;
    Ok(Listing::with_total(templates, total as u64))
}

/// Fetches one template by id.
pub async fn get(pool: &PgPool, id: &str) -> SqlResult<MealTemplate> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM meal_templates WHERE id = $1",
        COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(BackendError::from)?;
    match row {
        Some(row) => from_row(&row),
        None => Err(BackendError::NotFound),
    }
}

/// Inserts a fully-built template record.
pub async fn insert(pool: &PgPool, template: &MealTemplate) -> SqlResult<MealTemplate> {
    sqlx::query(
        "INSERT INTO meal_templates (id, title, description, meal_type, calories, \
         protein_g, carbs_g, fat_g, tags, created_by, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(&template.id)
    .bind(&template.title)
    .bind(&template.description)
    .bind(&template.meal_type)
    .bind(template.calories as i32)
    .bind(template.protein_g as i32)
    .bind(template.carbs_g as i32)
    .bind(template.fat_g as i32)
    .bind(&template.tags)
    .bind(&template.created_by)
    .bind(template.created_at)
    .bind(template.updated_at)
    .execute(pool)
    .await
    .map_err(BackendError::from)?;
    Ok(template.clone())
}

/// Applies a patch; returns the updated record.
pub async fn update(pool: &PgPool, id: &str, patch: &MealTemplatePatch) -> SqlResult<MealTemplate> {
    let mut builder =
        QueryBuilder::<Postgres>::new("UPDATE meal_templates SET updated_at = now()");
    if let Some(title) = &patch.title {
        builder.push(", title = ").push_bind(title.clone());
    }
    if let Some(description) = &patch.description {
        builder.push(", description = ").push_bind(description.clone());
    }
    if let Some(meal_type) = &patch.meal_type {
        builder.push(", meal_type = ").push_bind(meal_type.clone());
    }
    if let Some(calories) = patch.calories {
        builder.push(", calories = ").push_bind(calories as i32);
    }
    if let Some(protein) = patch.protein_g {
        builder.push(", protein_g = ").push_bind(protein as i32);
    }
    if let Some(carbs) = patch.carbs_g {
        builder.push(", carbs_g = ").push_bind(carbs as i32);
    }
    if let Some(fat) = patch.fat_g {
        builder.push(", fat_g = ").push_bind(fat as i32);
    }
    if let Some(tags) = &patch.tags {
        builder.push(", tags = ").push_bind(tags.clone());
    }
    builder.push(" WHERE id = ").push_bind(id.to_string());
    builder.push(format!(" RETURNING {}", COLUMNS));

    let row = builder
        .build()
        .fetch_optional(pool)
        .await
        .map_err(BackendError::from)?;
    match row {
        Some(row) => from_row(&row),
        None => Err(BackendError::NotFound),
    }
}

/// Deletes a template; returns whether it existed.
pub async fn delete(pool: &PgPool, id: &str) -> SqlResult<bool> {
    let result = sqlx::query("DELETE FROM meal_templates WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(BackendError::from)?;
    Ok(result.rows_affected() > 0)
}

/// Aggregate statistics over all templates.
pub async fn stats(pool: &PgPool) -> SqlResult<TemplateStats> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meal_templates")
        .fetch_one(pool)
        .await
        .map_err(BackendError::from)?;

    let type_rows =
        sqlx::query("SELECT meal_type, COUNT(*) AS n FROM meal_templates GROUP BY meal_type")
            .fetch_all(pool)
            .await
            .map_err(BackendError::from)?;
    let mut by_meal_type = std::collections::HashMap::new();
    for row in type_rows {
        let meal_type: String = row.try_get("meal_type")?;
        let n: i64 = row.try_get("n")?;
        by_meal_type.insert(meal_type, n as u64);
    }

    Ok(TemplateStats {
        total: total as u64,
        by_meal_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_clause_whitelists_columns() {
        assert_eq!(
            order_clause(Some(&SortSpec::ascending("title"))),
            " ORDER BY title ASC, id ASC"
        );
        assert_eq!(
            order_clause(Some(&SortSpec::descending("tags"))),
            " ORDER BY created_at DESC, id ASC"
        );
    }
}
