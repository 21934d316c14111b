//! Tantivy-based search index over checklist templates.
//!
//! Matches on template name, description, department tags and layout code,
//! with the name weighted highest.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, QueryParser};
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::ChecklistTemplate;

const BOOST_NAME: f32 = 10.0;
const BOOST_DEPARTMENTS: f32 = 6.0;
const BOOST_DESCRIPTION: f32 = 4.0;
const BOOST_KIND: f32 = 3.0;

/// Search hit with relevance score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub template_id: String,
    pub score: f32,
}

struct SearchFields {
    template_id: Field,
    name: Field,
    description: Field,
    departments: Field,
    kind: Field,
}

/// Tantivy search index for templates.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        let template_id = schema_builder.add_text_field("template_id", STRING | STORED);
        let name = schema_builder.add_text_field("name", TEXT | STORED);
        let description = schema_builder.add_text_field("description", TEXT);
        let departments = schema_builder.add_text_field("departments", TEXT);
        let kind = schema_builder.add_text_field("kind", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            template_id,
            name,
            description,
            departments,
            kind,
        };

        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(15_000_000)
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Replace the index contents with the given templates.
    pub async fn rebuild(&self, templates: &[ChecklistTemplate]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;
        writer.delete_all_documents()?;
        for template in templates {
            writer.add_document(self.create_document(template))?;
        }
        writer.commit()?;
        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} templates", templates.len());
        Ok(())
    }

    /// Index or re-index a single template.
    pub async fn index_template(&self, template: &ChecklistTemplate) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;
        let term = tantivy::Term::from_field_text(self.fields.template_id, &template.id);
        writer.delete_term(term);
        writer.add_document(self.create_document(template))?;
        writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    /// Search templates. An empty query yields no hits.
    pub fn search(
        &self,
        query_str: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchResult>, AppError> {
        if query_str.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        let query_parser = QueryParser::for_index(
            &self.index,
            vec![
                self.fields.name,
                self.fields.description,
                self.fields.departments,
                self.fields.kind,
            ],
        );
        let base_query = query_parser
            .parse_query(query_str)
            .map_err(|e| AppError::Search(format!("Invalid search query: {}", e)))?;

        let mut subqueries: Vec<(Occur, Box<dyn tantivy::query::Query>)> = Vec::new();
        let field_queries = [
            (self.fields.name, BOOST_NAME),
            (self.fields.departments, BOOST_DEPARTMENTS),
            (self.fields.description, BOOST_DESCRIPTION),
            (self.fields.kind, BOOST_KIND),
        ];
        for (field, boost) in field_queries {
            let field_parser = QueryParser::for_index(&self.index, vec![field]);
            if let Ok(field_query) = field_parser.parse_query(query_str) {
                subqueries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
            }
        }

        let combined_query = if subqueries.is_empty() {
            base_query
        } else {
            Box::new(BooleanQuery::new(subqueries))
        };

        let top_docs = searcher
            .search(&combined_query, &TopDocs::with_limit(limit + offset))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let results = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let template_id = doc.get_first(self.fields.template_id)?.as_str()?.to_string();
                Some(SearchResult { template_id, score })
            })
            .collect();

        Ok(results)
    }

    fn create_document(&self, template: &ChecklistTemplate) -> TantivyDocument {
        // "oil_change" indexes as "oil change"
        let kind = template
            .type_code
            .map(|k| k.as_str().replace('_', " "))
            .unwrap_or_default();

        doc!(
            self.fields.template_id => template.id.clone(),
            self.fields.name => template.name.clone(),
            self.fields.description => template.description.clone().unwrap_or_default(),
            self.fields.departments => template.departments.join(" "),
            self.fields.kind => kind
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TemplateKind;
    use tempfile::TempDir;

    fn template(id: &str, name: &str, departments: &[&str]) -> ChecklistTemplate {
        ChecklistTemplate {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            config: serde_json::Value::Null,
            active: true,
            departments: departments.iter().map(|d| d.to_string()).collect(),
            type_code: None,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
            version: 1,
        }
    }

    #[tokio::test]
    async fn test_name_matches_rank_first() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let templates = vec![
            template("1", "Fridge temperatures", &["Operations"]),
            template("2", "Pizza oven log", &["Pizza"]),
            template("3", "Dough production", &["Pizza"]),
        ];
        index.rebuild(&templates).await.unwrap();

        let results = index.search("fridge", 10, 0).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].template_id, "1");

        let results = index.search("pizza", 10, 0).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].template_id, "2");
    }

    #[tokio::test]
    async fn test_reindex_replaces_document() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let mut fryer = template("1", "Fryer", &[]);
        index.rebuild(&[fryer.clone()]).await.unwrap();

        fryer.name = "Grease trap".to_string();
        fryer.type_code = Some(TemplateKind::OilChange);
        index.index_template(&fryer).await.unwrap();

        assert!(index.search("fryer", 10, 0).unwrap().is_empty());
        assert_eq!(index.search("grease", 10, 0).unwrap().len(), 1);
        assert_eq!(index.search("oil", 10, 0).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_empty_query() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let results = index.search("", 10, 0).unwrap();
        assert!(results.is_empty());
    }
}
