use tokio_postgres::tls::NoTlsStream;
use tokio_postgres::{Client, Connection, NoTls, Socket};
use tracing::info;

use crate::schema::cardinality::{RawForeignKey, RawKey};
use crate::schema::refresh::RawColumn;

use super::config::ConnectorConfig;

/// Manages a connection to the introspected PostgreSQL database.
///
/// This client runs only catalog queries: column metadata, key constraints,
/// and foreign keys. Query execution against user tables is the embedding
/// application's concern.
pub struct PgClient {
  client: Client,
  config: ConnectorConfig,
}

impl PgClient {
  /// Connect to the PostgreSQL database.
  pub async fn connect(
    config: ConnectorConfig,
  ) -> anyhow::Result<(Self, Connection<Socket, NoTlsStream>)> {
    let (client, connection) = tokio_postgres::connect(&config.connection_string, NoTls).await?;

    info!(
        app_name = %config.application_name,
        "connected to PostgreSQL for schema introspection"
    );

    Ok((Self { client, config }, connection))
  }

  /// Returns a reference to the underlying tokio-postgres client.
  pub fn inner(&self) -> &Client {
    &self.client
  }

  /// Returns the connector configuration.
  pub fn config(&self) -> &ConnectorConfig {
    &self.config
  }

  /// Column metadata for every table in the given schemas.
  pub async fn columns(&self, schemas: &[String]) -> anyhow::Result<Vec<RawColumn>> {
    let rows = self
      .client
      .query(
        "SELECT table_schema, table_name, column_name, udt_name,
                is_nullable, ordinal_position::int4
           FROM information_schema.columns
          WHERE table_schema = ANY($1)
          ORDER BY table_schema, table_name, ordinal_position",
        &[&schemas],
      )
      .await?;

    Ok(
      rows
        .iter()
        .map(|r| {
          let nullable: String = r.get(4);
          RawColumn {
            schema: r.get(0),
            table: r.get(1),
            name: r.get(2),
            type_name: r.get(3),
            is_nullable: nullable == "YES",
            ordinal_position: r.get(5),
          }
        })
        .collect(),
    )
  }

  /// Primary and unique key constraints in the given schemas, with their
  /// column lists in constraint order.
  pub async fn key_constraints(&self, schemas: &[String]) -> anyhow::Result<Vec<RawKey>> {
    let rows = self
      .client
      .query(
        "SELECT n.nspname, c.relname, con.contype::text,
                ARRAY(SELECT a.attname
                        FROM unnest(con.conkey) WITH ORDINALITY k(attnum, ord)
                        JOIN pg_attribute a
                          ON a.attrelid = con.conrelid AND a.attnum = k.attnum
                       ORDER BY k.ord)::text[]
           FROM pg_constraint con
           JOIN pg_class c ON c.oid = con.conrelid
           JOIN pg_namespace n ON n.oid = c.relnamespace
          WHERE con.contype IN ('p', 'u') AND n.nspname = ANY($1)
          ORDER BY n.nspname, c.relname, con.conname",
        &[&schemas],
      )
      .await?;

    Ok(
      rows
        .iter()
        .map(|r| {
          let contype: String = r.get(2);
          RawKey {
            schema: r.get(0),
            table: r.get(1),
            columns: r.get(3),
            is_primary: contype == "p",
          }
        })
        .collect(),
    )
  }

  /// Foreign keys in the given schemas, with source and target column lists
  /// paired by position.
  pub async fn foreign_keys(&self, schemas: &[String]) -> anyhow::Result<Vec<RawForeignKey>> {
    let rows = self
      .client
      .query(
        "SELECT con.conname,
                sn.nspname, sc.relname,
                ARRAY(SELECT a.attname
                        FROM unnest(con.conkey) WITH ORDINALITY k(attnum, ord)
                        JOIN pg_attribute a
                          ON a.attrelid = con.conrelid AND a.attnum = k.attnum
                       ORDER BY k.ord)::text[],
                tn.nspname, tc.relname,
                ARRAY(SELECT a.attname
                        FROM unnest(con.confkey) WITH ORDINALITY k(attnum, ord)
                        JOIN pg_attribute a
                          ON a.attrelid = con.confrelid AND a.attnum = k.attnum
                       ORDER BY k.ord)::text[]
           FROM pg_constraint con
           JOIN pg_class sc ON sc.oid = con.conrelid
           JOIN pg_namespace sn ON sn.oid = sc.relnamespace
           JOIN pg_class tc ON tc.oid = con.confrelid
           JOIN pg_namespace tn ON tn.oid = tc.relnamespace
          WHERE con.contype = 'f' AND sn.nspname = ANY($1)
          ORDER BY sn.nspname, sc.relname, con.conname",
        &[&schemas],
      )
      .await?;

    Ok(
      rows
        .iter()
        .map(|r| RawForeignKey {
          constraint: r.get(0),
          source_schema: r.get(1),
          source_table: r.get(2),
          source_columns: r.get(3),
          target_schema: r.get(4),
          target_table: r.get(5),
          target_columns: r.get(6),
        })
        .collect(),
    )
  }
}
