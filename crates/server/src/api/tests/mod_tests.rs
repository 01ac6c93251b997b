use super::*;
use shared::error::ErrorCode;

fn setup() -> (ApiContext, ProjectId) {
    let project = crate::config::demo_project("demo");
    let project_id = project.project_id.clone();
    (ApiContext::new(project), project_id)
}

fn request(ids: &[i64], name: Option<&str>, anonymous: bool) -> CreatePrivateLinkRequest {
    CreatePrivateLinkRequest {
        node_ids: ids.iter().copied().map(NodeId::Numeric).collect(),
        name: name.map(str::to_string),
        anonymous,
    }
}

#[test]
fn node_tree_mirrors_project() {
    let (ctx, project_id) = setup();
    let tree = node_tree(&ctx, &project_id).expect("tree");
    assert_eq!(tree.node.title, ctx.project.title);
    assert_eq!(tree.children, ctx.project.children);
}

#[test]
fn unknown_project_is_not_found() {
    let (ctx, _) = setup();
    let err = node_tree(&ctx, &ProjectId("nope".into())).expect_err("should fail");
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn creates_link_and_lists_it() {
    let (ctx, project_id) = setup();
    let link = create_private_link(&ctx, &project_id, request(&[2, 1], Some("  Reviewers "), true))
        .await
        .expect("link");

    assert_eq!(link.node_ids, vec![NodeId::Numeric(2), NodeId::Numeric(1)]);
    assert_eq!(link.name.as_deref(), Some("Reviewers"));
    assert!(link.anonymous);

    let links = list_private_links(&ctx, &project_id).await.expect("links");
    assert_eq!(links, vec![link]);
}

#[tokio::test]
async fn empty_selection_is_rejected() {
    let (ctx, project_id) = setup();
    let err = create_private_link(&ctx, &project_id, request(&[], Some("x"), false))
        .await
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(ctx.links.read().await.is_empty());
}

#[tokio::test]
async fn foreign_node_is_rejected() {
    let (ctx, project_id) = setup();
    let err = create_private_link(&ctx, &project_id, request(&[1, 77], None, false))
        .await
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(err.message.contains("77"));
}

#[tokio::test]
async fn duplicate_ids_collapse_and_blank_name_is_absent() {
    let (ctx, project_id) = setup();
    let link = create_private_link(&ctx, &project_id, request(&[3, 3, 1], Some("   "), false))
        .await
        .expect("link");
    assert_eq!(link.node_ids, vec![NodeId::Numeric(3), NodeId::Numeric(1)]);
    assert_eq!(link.name, None);
}

#[tokio::test]
async fn overlong_name_is_rejected() {
    let (ctx, project_id) = setup();
    let name = "n".repeat(MAX_LINK_NAME_CHARS + 1);
    let err = create_private_link(&ctx, &project_id, request(&[1], Some(&name), false))
        .await
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn each_link_gets_its_own_key() {
    let (ctx, project_id) = setup();
    let first = create_private_link(&ctx, &project_id, request(&[1], None, false))
        .await
        .expect("first");
    let second = create_private_link(&ctx, &project_id, request(&[1], None, false))
        .await
        .expect("second");
    assert_ne!(first.key, second.key);
    assert_eq!(list_private_links(&ctx, &project_id).await.expect("links").len(), 2);
}
