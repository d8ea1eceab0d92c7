// Quick and dirty "DRY"

/// Release on drop and expose the underlying handle.
/// The type must provide `fn release(&mut self) -> Result`.
#[macro_export]
macro_rules! DeriveHandle {
    ( $name:ident ) => (
        impl Drop for $name {
            fn drop(&mut self) {
                if let Err(err) = self.release() {
                    log::error!("failed to release {}({}): {}",
                                stringify!($name),
                                self.handle,
                                err);
                }
            }
        }

        impl $crate::SpxHandle for $name {
            fn handle(&self) -> $crate::Handle {
                self.handle
            }
        }
    )
}

/// Implement `PropertyBag` by delegating to the `props` field.
#[macro_export]
macro_rules! FlattenProps {
    ( $name:ident ) => (
        impl $crate::properties::PropertyBag for $name {
            fn get_by_id(
                &self,
                id: $crate::properties::PropertyId,
            ) -> $crate::Result<String> {
                self.props.get_by_id(id)
            }

            fn get_by_name(&self, name: &str) -> $crate::Result<String> {
                self.props.get_by_name(name)
            }

            fn put_by_id(
                &self,
                id: $crate::properties::PropertyId,
                value: &str,
            ) -> $crate::Result {
                self.props.put_by_id(id, value)
            }

            fn put_by_name(&self, name: &str, value: &str) -> $crate::Result {
                self.props.put_by_name(name, value)
            }
        }
    )
}

#[macro_export]
macro_rules! DefineProperty {
    ($getter:ident, $id:expr) => (
        pub fn $getter(&self) -> $crate::Result<String> {
            self.get_by_id($id)
        }
    );

    ($getter:ident, $setter:ident, $id:expr) => (
        pub fn $getter(&self) -> $crate::Result<String> {
            self.get_by_id($id)
        }

        pub fn $setter<T: ToString>(&self, v: T) -> $crate::Result {
            self.put_by_id($id, &v.to_string())
        }
    )
}
