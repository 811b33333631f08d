//! Extension traits implemented by beans and by the factory.

mod factory_bean;
mod lifecycle;
mod resolver;

pub use factory_bean::FactoryBean;
pub use lifecycle::{DisposableBean, InitializingBean};
pub use resolver::BeanResolver;
