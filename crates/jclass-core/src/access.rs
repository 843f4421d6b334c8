//! Access/modifier flag bitsets (§6), one per declaration kind the JVM
//! spec assigns a distinct legal-bit-combination to.

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClassAccess: u16 {
        const PUBLIC     = 0x0001;
        const FINAL      = 0x0010;
        const SUPER      = 0x0020;
        const INTERFACE  = 0x0200;
        const ABSTRACT   = 0x0400;
        const SYNTHETIC  = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM       = 0x4000;
        const MODULE     = 0x8000;
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FieldAccess: u16 {
        const PUBLIC    = 0x0001;
        const PRIVATE   = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC    = 0x0008;
        const FINAL     = 0x0010;
        const VOLATILE  = 0x0040;
        const TRANSIENT = 0x0080;
        const SYNTHETIC = 0x1000;
        const ENUM      = 0x4000;
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MethodAccess: u16 {
        const PUBLIC       = 0x0001;
        const PRIVATE      = 0x0002;
        const PROTECTED    = 0x0004;
        const STATIC       = 0x0008;
        const FINAL        = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE       = 0x0040;
        const VARARGS      = 0x0080;
        const NATIVE       = 0x0100;
        const ABSTRACT     = 0x0400;
        const STRICT       = 0x0800;
        const SYNTHETIC    = 0x1000;
    }
}

impl ClassAccess {
    pub fn is_interface(self) -> bool {
        self.contains(ClassAccess::INTERFACE)
    }

    pub fn is_enum(self) -> bool {
        self.contains(ClassAccess::ENUM)
    }

    pub fn is_annotation(self) -> bool {
        self.contains(ClassAccess::ANNOTATION)
    }
}

impl MethodAccess {
    pub fn is_constructor_like(self) -> bool {
        !self.contains(MethodAccess::STATIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_implies_final_super_in_practice_but_bits_are_independent() {
        let flags = ClassAccess::PUBLIC | ClassAccess::ENUM | ClassAccess::FINAL;
        assert!(flags.is_enum());
        assert!(flags.contains(ClassAccess::FINAL));
        assert!(!flags.is_interface());
    }

    #[test]
    fn method_access_bridge_and_varargs_are_distinct_bits() {
        let flags = MethodAccess::PUBLIC | MethodAccess::VARARGS;
        assert!(flags.contains(MethodAccess::VARARGS));
        assert!(!flags.contains(MethodAccess::BRIDGE));
    }
}
