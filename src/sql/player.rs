//! Player operations for the PostgreSQL backend.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use super::SqlResult;
use crate::backend::BackendError;
use crate::player::{Player, PlayerFilter, PlayerPatch, PlayerStats};
use crate::query::{ListQuery, Listing, SortSpec};

const COLUMNS: &str = "id, name, squad, position, height_cm, weight_kg, \
     target_calories, target_protein_g, target_carbs_g, target_fat_g, \
     dietary_restrictions, created_by, created_at, updated_at";

fn from_row(row: &PgRow) -> SqlResult<Player> {
    Ok(Player {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        squad: row.try_get("squad")?,
        position: row.try_get("position")?,
        height_cm: row.try_get("height_cm")?,
        weight_kg: row.try_get("weight_kg")?,
        target_calories: row.try_get::<i32, _>("target_calories")? as u32,
        target_protein_g: row.try_get::<i32, _>("target_protein_g")? as u32,
        target_carbs_g: row.try_get::<i32, _>("target_carbs_g")? as u32,
        target_fat_g: row.try_get::<i32, _>("target_fat_g")? as u32,
        dietary_restrictions: row.try_get("dietary_restrictions")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &PlayerFilter) {
    builder.push(" WHERE TRUE");
    if let Some(squad) = &filter.squad {
        builder.push(" AND squad = ").push_bind(squad.clone());
    }
    if let Some(position) = &filter.position {
        builder.push(" AND position = ").push_bind(position.clone());
    }
    if let Some(search) = &filter.search {
        builder
            .push(" AND name ILIKE ")
            .push_bind(format!("%{}%", search));
    }
}

fn order_clause(sort: Option<&SortSpec>) -> String {
    let (column, ascending) = match sort {
        Some(sort) => (sort.column.as_str(), sort.ascending),
        None => ("created_at", true),
    };
    let column = match column {
        "name" => "name",
        "squad" => "squad",
        "weight_kg" => "weight_kg",
        "target_calories" => "target_calories",
        _ => "created_at",
    };
    let direction = if ascending { "ASC" } else { "DESC" };
    format!(" ORDER BY {} {}, id ASC", column, direction)
}

/// Lists players matching the query, with the total matching count.
pub async fn list(pool: &PgPool, query: &ListQuery<PlayerFilter>) -> SqlResult<Listing<Player>> {
    let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM players");
    push_filters(&mut count_builder, &query.filter);
    let total: i64 = count_builder
        .build_query_scalar()
        .fetch_one(pool)
        .await
        .map_err(BackendError::from)?;

    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {} FROM players", COLUMNS));
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
    let players = rows.iter().map(from_row).collect::<SqlResult<Vec<_>>>()?;
    Ok(Listing::with_total(players, total as u64))
}

/// Fetches one player by id.
pub async fn get(pool: &PgPool, id: &str) -> SqlResult<Player> {
    let row = sqlx::query(&format!("SELECT {} FROM players WHERE id = $1", COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(BackendError::from)?;
    match row {
        Some(row) => from_row(&row),
        None => Err(BackendError::NotFound),
    }
}

/// Inserts a fully-built player record.
pub async fn insert(pool: &PgPool, player: &Player) -> SqlResult<Player> {
    sqlx::query(
        "INSERT INTO players (id, name, squad, position, height_cm, weight_kg, \
         target_calories, target_protein_g, target_carbs_g, target_fat_g, \
         dietary_restrictions, created_by, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
    )
    .bind(&player.id)
    .bind(&player.name)
    .bind(&player.squad)
    .bind(&player.position)
    .bind(player.height_cm)
    .bind(player.weight_kg)
    .bind(player.target_calories as i32)
    .bind(player.target_protein_g as i32)
    .bind(player.target_carbs_g as i32)
    .bind(player.target_fat_g as i32)
    .bind(&player.dietary_restrictions)
    .bind(&player.created_by)
    .bind(player.created_at)
    .bind(player.updated_at)
    .execute(pool)
    .await
    .map_err(BackendError::from)?;
    Ok(player.clone())
}

/// Applies a patch; returns the updated record.
pub async fn update(pool: &PgPool, id: &str, patch: &PlayerPatch) -> SqlResult<Player> {
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE players SET updated_at = now()");
    if let Some(name) = &patch.name {
        builder.push(", name = ").push_bind(name.clone());
    }
    if let Some(squad) = &patch.squad {
        builder.push(", squad = ").push_bind(squad.clone());
    }
    if let Some(position) = &patch.position {
        builder.push(", position = ").push_bind(position.clone());
    }
    if let Some(height) = patch.height_cm {
        builder.push(", height_cm = ").push_bind(height);
    }
    if let Some(weight) = patch.weight_kg {
        builder.push(", weight_kg = ").push_bind(weight);
    }
    if let Some(calories) = patch.target_calories {
        builder
            .push(", target_calories = ")
            .push_bind(calories as i32);
    }
    if let Some(protein) = patch.target_protein_g {
        builder
            .push(", target_protein_g = ")
            .push_bind(protein as i32);
    }
    if let Some(carbs) = patch.target_carbs_g {
        builder.push(", target_carbs_g = ").push_bind(carbs as i32);
    }
    if let Some(fat) = patch.target_fat_g {
        builder.push(", target_fat_g = ").push_bind(fat as i32);
    }
    if let Some(restrictions) = &patch.dietary_restrictions {
        builder
            .push(", dietary_restrictions = ")
            .push_bind(restrictions.clone());
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

/// Deletes a player; returns whether it existed. Plans cascade via the
/// schema's foreign key.
pub async fn delete(pool: &PgPool, id: &str) -> SqlResult<bool> {
    let result = sqlx::query("DELETE FROM players WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(BackendError::from)?;
    Ok(result.rows_affected() > 0)
}

/// Aggregate statistics over all players.
pub async fn stats(pool: &PgPool) -> SqlResult<PlayerStats> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS total, \
         COALESCE(AVG(target_calories::float8), 0)::float8 AS avg_target_calories \
         FROM players",
    )
    .fetch_one(pool)
    .await
    .map_err(BackendError::from)?;
    let total: i64 = row.try_get("total")?;
    let avg_target_calories: f64 = row.try_get("avg_target_calories")?;

    let squad_rows = sqlx::query("SELECT squad, COUNT(*) AS n FROM players GROUP BY squad")
        .fetch_all(pool)
        .await
        .map_err(BackendError::from)?;
    let mut by_squad = std::collections::HashMap::new();
    for row in squad_rows {
        let squad: String = row.try_get("squad")?;
        let n: i64 = row.try_get("n")?;
        by_squad.insert(squad, n as u64);
    }

    Ok(PlayerStats {
        total: total as u64,
        avg_target_calories,
        by_squad,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_clause_whitelists_columns() {
        assert_eq!(
            order_clause(Some(&SortSpec::ascending("name"))),
            " ORDER BY name ASC, id ASC"
        );
        assert_eq!(
            order_clause(Some(&SortSpec::descending("weight_kg"))),
            " ORDER BY weight_kg DESC, id ASC"
        );
        // Unknown or hostile column names fall back to created_at.
        assert_eq!(
            order_clause(Some(&SortSpec::ascending("name; DROP TABLE players"))),
            " ORDER BY created_at ASC, id ASC"
        );
        assert_eq!(order_clause(None), " ORDER BY created_at ASC, id ASC");
    }
}
