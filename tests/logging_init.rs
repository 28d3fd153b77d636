//! Subscriber installation, kept in its own binary so the global
//! subscriber does not leak into other tests

#[test]
fn test_init_twice() {
    assert!(code_widget::logging::init().is_ok());
    assert!(code_widget::logging::init().is_ok());
}
